//! Blink and twitch clips, and the single-slot player that runs them.
//!
//! A clip is a set of keyframed weight curves, one per blend-shape channel.
//! Playback is a plain (clip, elapsed) pair advanced once per step: each step
//! samples the clip at the elapsed time and then advances; once the elapsed
//! time passes the clip length the final frame is sampled and the slot frees.
//!
//! Blink and twitch share one slot. Starting either while the slot is busy,
//! or while animation is disabled, does nothing.

use serde::{Deserialize, Serialize};

use crate::blend_shapes::{BlendShape, BlendShapeVector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear curve. Keys are kept sorted by time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightCurve {
    keys: Vec<Keyframe>,
}

impl WeightCurve {
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Value at `time`, holding the first/last key outside the keyed span.
    pub fn sample(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if time <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let t = (time - a.time) / span;
                return a.value + (b.value - a.value) * t;
            }
        }
        last.value
    }
}

/// One curve bound to one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub channel: BlendShape,
    pub curve: WeightCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Clip {
    /// A single-channel clip that rises to `peak`, holds, and falls back to 0.
    pub fn pulse(name: &str, channel: BlendShape, peak: f32, attack: f32, hold: f32, release: f32) -> Self {
        let curve = WeightCurve::new(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(attack, peak),
            Keyframe::new(attack + hold, peak),
            Keyframe::new(attack + hold + release, 0.0),
        ]);
        Self {
            name: name.to_string(),
            tracks: vec![Track { channel, curve }],
        }
    }

    pub fn length(&self) -> f32 {
        self.tracks
            .iter()
            .map(|t| t.curve.duration())
            .fold(0.0, f32::max)
    }

    /// Write every track's value at `time` into `weights`.
    pub fn sample_into(&self, time: f32, weights: &mut BlendShapeVector) {
        for track in &self.tracks {
            weights.set(track.channel, track.curve.sample(time));
        }
    }
}

/// How strongly a patient's eye twitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TwitchDegree {
    #[default]
    None,
    Small,
    Medium,
    Large,
}

/// The clips the player can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipLibrary {
    pub blink: Clip,
    pub small_twitch: Clip,
    pub medium_twitch: Clip,
    pub large_twitch: Clip,
}

impl Default for ClipLibrary {
    fn default() -> Self {
        Self {
            blink: Clip::pulse("blink", BlendShape::Blink, 100.0, 0.07, 0.05, 0.13),
            small_twitch: Clip::pulse("twitch_small", BlendShape::Twitch, 35.0, 0.04, 0.02, 0.08),
            medium_twitch: Clip::pulse("twitch_medium", BlendShape::Twitch, 65.0, 0.05, 0.06, 0.12),
            large_twitch: Clip::pulse("twitch_large", BlendShape::Twitch, 100.0, 0.05, 0.15, 0.2),
        }
    }
}

impl ClipLibrary {
    /// Clip for a twitch degree; `None` has no clip.
    pub fn twitch(&self, degree: TwitchDegree) -> Option<&Clip> {
        match degree {
            TwitchDegree::None => None,
            TwitchDegree::Small => Some(&self.small_twitch),
            TwitchDegree::Medium => Some(&self.medium_twitch),
            TwitchDegree::Large => Some(&self.large_twitch),
        }
    }

    pub fn clip_for(&self, kind: PlaybackKind) -> Option<&Clip> {
        match kind {
            PlaybackKind::Blink => Some(&self.blink),
            PlaybackKind::Twitch(degree) => self.twitch(degree),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    Blink,
    Twitch(TwitchDegree),
}

/// A clip in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePlayback {
    pub kind: PlaybackKind,
    pub elapsed: f32,
}

/// Single-slot blink/twitch player.
#[derive(Debug, Clone)]
pub struct EyelidAnimator {
    library: ClipLibrary,
    active: Option<ActivePlayback>,
    can_animate: bool,
}

impl EyelidAnimator {
    pub fn new(library: ClipLibrary) -> Self {
        Self {
            library,
            active: None,
            can_animate: true,
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    pub fn active(&self) -> Option<ActivePlayback> {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn can_animate(&self) -> bool {
        self.can_animate
    }

    /// Allow or forbid starting new clips. A clip already playing finishes.
    pub fn set_can_animate(&mut self, can: bool) {
        self.can_animate = can;
    }

    /// Start a blink. Returns whether it started.
    pub fn start_blink(&mut self) -> bool {
        self.start(PlaybackKind::Blink)
    }

    /// Start a twitch of the given degree. Returns whether it started.
    pub fn start_twitch(&mut self, degree: TwitchDegree) -> bool {
        if degree == TwitchDegree::None {
            log::warn!("Twitch requested for an eye that cannot twitch, ignoring");
            return false;
        }
        self.start(PlaybackKind::Twitch(degree))
    }

    fn start(&mut self, kind: PlaybackKind) -> bool {
        if self.active.is_some() || !self.can_animate {
            return false;
        }
        self.active = Some(ActivePlayback { kind, elapsed: 0.0 });
        true
    }

    /// Cancel a running blink. Twitches are left alone.
    pub fn stop_blink(&mut self) {
        if matches!(self.active, Some(a) if a.kind == PlaybackKind::Blink) {
            self.active = None;
        }
    }

    /// Cancel a running twitch. Blinks are left alone.
    pub fn stop_twitch(&mut self) {
        if matches!(self.active, Some(a) if matches!(a.kind, PlaybackKind::Twitch(_))) {
            self.active = None;
        }
    }

    /// Advance the running clip and write its channels into `weights`.
    ///
    /// Returns the kind of clip that completed this step, if any.
    pub fn step(&mut self, dt: f32, weights: &mut BlendShapeVector) -> Option<PlaybackKind> {
        let mut active = self.active?;
        let clip = match self.library.clip_for(active.kind) {
            Some(clip) => clip,
            None => {
                self.active = None;
                return None;
            }
        };
        let length = clip.length();

        if active.elapsed <= length {
            clip.sample_into(active.elapsed, weights);
            active.elapsed += dt.max(0.0);
            self.active = Some(active);
            None
        } else {
            clip.sample_into(length, weights);
            self.active = None;
            Some(active.kind)
        }
    }
}

impl Default for EyelidAnimator {
    fn default() -> Self {
        Self::new(ClipLibrary::default())
    }
}
