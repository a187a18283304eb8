//! Ocular Headless Harness
//!
//! Drives eyeballs, speculums and lamps with the shipped tuning file and
//! checks the behavioral guarantees the renderer relies on.
//! Runs entirely in-process: no window, no GPU.
//!
//! Usage:
//!   cargo run -p ocular-simtest
//!   cargo run -p ocular-simtest -- --verbose

use glam::{Quat, Vec3};
use ocular_core::prelude::*;
use ocular_logic::blend_shapes::GazeMapping;
use ocular_logic::breath::BreathOscillator;
use ocular_logic::flicker::FlickerLight;
use ocular_logic::math::{angle_between_deg, map_clamped, pitch_yaw_deg, quat_from_euler_deg};
use ocular_logic::motion::{EyeMotion, SampleEvent};
use ocular_logic::playback::PlaybackKind;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Tuning (same JSON the viewer loads) ─────────────────────────────────
const TUNING_JSON: &str = include_str!("../../../data/eyeball_tuning.json");

const DT: f32 = 1.0 / 60.0;
const SEEDS: [u64; 4] = [1, 7, 42, 1234];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Ocular Eye Harness ===\n");

    let mut results = Vec::new();

    // 1. Tuning file
    let tuning = validate_tuning_file(&mut results).unwrap_or_default();

    // 2. Range mapping
    results.extend(validate_mapping(verbose));

    // 3. Idle sampling and easing
    results.extend(validate_motion(&tuning, verbose));

    // 4. Agitated base reset
    results.extend(validate_agitated(&tuning, verbose));

    // 5. Breathing
    results.extend(validate_breath(&tuning, verbose));

    // 6. Gaze blend shapes
    results.extend(validate_gaze(&tuning, verbose));

    // 7. Blink / twitch slot
    results.extend(validate_playback(&tuning, verbose));

    // 8. Speculum exam flow
    results.extend(validate_speculum(&tuning, verbose));

    // 9. Eye dropper
    results.extend(validate_dropper(&tuning, verbose));

    // 10. Judgement stamp
    results.extend(validate_judgement(&tuning, verbose));

    // 11. Flicker light
    results.extend(validate_flicker(&tuning, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Tuning File ──────────────────────────────────────────────────────

fn validate_tuning_file(results: &mut Vec<TestResult>) -> Option<Tuning> {
    println!("--- Tuning File ---");

    let raw: serde_json::Value = match serde_json::from_str(TUNING_JSON) {
        Ok(v) => v,
        Err(e) => {
            results.push(TestResult {
                name: "tuning_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    let sections = [
        "motion", "breath", "gaze", "cadence", "speculum", "dropper", "judgement", "flicker",
    ];
    let missing: Vec<&str> = sections
        .iter()
        .copied()
        .filter(|s| raw.get(s).is_none())
        .collect();
    results.push(TestResult {
        name: "tuning_sections_present".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            format!("{} sections", sections.len())
        } else {
            format!("missing: {:?}", missing)
        },
    });

    match Tuning::from_json(TUNING_JSON) {
        Ok(tuning) => {
            results.push(TestResult {
                name: "tuning_valid".into(),
                passed: true,
                detail: "parsed and validated".into(),
            });
            Some(tuning)
        }
        Err(e) => {
            results.push(TestResult {
                name: "tuning_valid".into(),
                passed: false,
                detail: e.to_string(),
            });
            None
        }
    }
}

// ── 2. Range Mapping ────────────────────────────────────────────────────

fn validate_mapping(_verbose: bool) -> Vec<TestResult> {
    println!("--- Range Mapping ---");
    let mut results = Vec::new();

    let cases: [(f32, f32); 5] = [
        (5.0, 50.0),
        (-5.0, 0.0),
        (15.0, 100.0),
        (0.0, 0.0),
        (10.0, 100.0),
    ];
    let bad: Vec<String> = cases
        .iter()
        .filter(|(v, expected)| (map_clamped(*v, 0.0, 10.0, 0.0, 100.0) - *expected).abs() > 1e-4)
        .map(|(v, expected)| format!("map({})!={}", v, expected))
        .collect();
    results.push(TestResult {
        name: "map_clamped_cases".into(),
        passed: bad.is_empty(),
        detail: if bad.is_empty() {
            format!("{} cases", cases.len())
        } else {
            bad.join(", ")
        },
    });

    let degenerate = map_clamped(3.0, 2.0, 2.0, 10.0, 20.0);
    results.push(TestResult {
        name: "map_clamped_degenerate".into(),
        passed: degenerate == 10.0,
        detail: format!("zero-width source maps to {}", degenerate),
    });

    results
}

// ── 3. Motion ───────────────────────────────────────────────────────────

fn validate_motion(tuning: &Tuning, verbose: bool) -> Vec<TestResult> {
    println!("--- Eye Motion ---");
    let mut results = Vec::new();
    let idle = tuning.motion.idle;

    let mut worst_micro: f32 = 0.0;
    let mut worst_correction: f32 = 0.0;
    let mut worst_step_excess = f32::MIN;
    let mut corrections = 0;

    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut motion = EyeMotion::new(tuning.motion, Quat::IDENTITY, &mut rng);
        let mut prev = motion.current();
        for _ in 0..(60 * 30) {
            for event in motion.step(DT, &mut rng) {
                match event {
                    SampleEvent::MicroJitter { pitch, yaw } => {
                        worst_micro = worst_micro.max(pitch.abs()).max(yaw.abs());
                    }
                    SampleEvent::CorrectiveSaccade { pitch, yaw } => {
                        corrections += 1;
                        worst_correction = worst_correction.max(pitch.abs()).max(yaw.abs());
                    }
                    _ => {}
                }
            }
            let step = angle_between_deg(prev, motion.current());
            worst_step_excess = worst_step_excess.max(step - idle.saccade_speed * DT);
            prev = motion.current();
        }
    }

    results.push(TestResult {
        name: "idle_micro_range".into(),
        passed: worst_micro <= idle.micro_range + 1e-4,
        detail: format!("max |offset| {:.3}° (limit {:.3}°)", worst_micro, idle.micro_range),
    });
    results.push(TestResult {
        name: "idle_correction_range".into(),
        passed: corrections > 0 && worst_correction <= idle.correction_range + 1e-4,
        detail: format!(
            "{} saccades, max |offset| {:.3}° (limit {:.3}°)",
            corrections, worst_correction, idle.correction_range
        ),
    });
    results.push(TestResult {
        name: "idle_angular_speed".into(),
        passed: worst_step_excess <= 0.05,
        detail: format!("worst excess over speed·dt {:.4}°", worst_step_excess.max(0.0)),
    });

    if verbose {
        println!("  {} idle saccades across {} seeds", corrections, SEEDS.len());
    }

    results
}

// ── 4. Agitated ─────────────────────────────────────────────────────────

fn validate_agitated(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Agitated ---");
    let mut results = Vec::new();
    let window = tuning.motion.base_reset_interval.high() + 1.0;

    let mut all_reset = true;
    let mut worst_step_excess = f32::MIN;
    for seed in SEEDS {
        let mut engine = ExamEngine::with_tuning(tuning.clone(), seed);
        let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, PatientProfile::default());
        engine.push(eye, Command::SetMotionState(MotionState::Agitated));

        let mut reset = false;
        let mut prev = engine.eye_rotation(eye).unwrap_or(Quat::IDENTITY);
        for _ in 0..((window / DT) as usize) {
            engine.update(DT);
            if let Some(activity) = engine.activity(eye) {
                reset |= activity.samples.contains(&SampleEvent::BaseReset);
            }
            let current = engine.eye_rotation(eye).unwrap_or(Quat::IDENTITY);
            let step = angle_between_deg(prev, current);
            worst_step_excess =
                worst_step_excess.max(step - tuning.motion.agitated.saccade_speed * DT);
            prev = current;
        }
        all_reset &= reset;
    }

    results.push(TestResult {
        name: "agitated_base_reset".into(),
        passed: all_reset,
        detail: format!("dynamic base snapped home within {:.1}s on every seed", window),
    });
    results.push(TestResult {
        name: "agitated_angular_speed".into(),
        passed: worst_step_excess <= 0.05,
        detail: format!("worst excess over speed·dt {:.4}°", worst_step_excess.max(0.0)),
    });

    results
}

// ── 5. Breath ───────────────────────────────────────────────────────────

fn validate_breath(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Breath ---");
    let mut results = Vec::new();
    let breath = tuning.breath;

    let period = 1.0 / breath.base_frequency;
    let drift = (0..100)
        .map(|i| {
            let t = i as f32 * 0.173;
            (breath.primary(t) - breath.primary(t + period)).abs()
        })
        .fold(0.0, f32::max);
    results.push(TestResult {
        name: "breath_periodic".into(),
        passed: drift < 1e-4,
        detail: format!("period {:.2}s, max drift {:.6}", period, drift),
    });

    let peak = (0..2000)
        .map(|i| breath.primary(i as f32 * 0.01).abs())
        .fold(0.0, f32::max);
    results.push(TestResult {
        name: "breath_amplitude".into(),
        passed: peak <= breath.amplitude + 1e-6,
        detail: format!("peak {:.5} (amplitude {:.5})", peak, breath.amplitude),
    });

    let mut rng = StdRng::seed_from_u64(5);
    let mut osc = BreathOscillator::new(breath, Vec3::ZERO, Quat::IDENTITY, &mut rng);
    for _ in 0..60 {
        osc.step(DT, &mut rng);
    }
    osc.pause();
    let held = osc.position();
    for _ in 0..(60 * 30) {
        osc.step(DT, &mut rng);
    }
    let stayed = osc.is_paused() && osc.position() == held;
    osc.resume(&mut rng);
    let gap = osc.state().next_pause_at - osc.clock();
    results.push(TestResult {
        name: "breath_manual_pause".into(),
        passed: stayed && gap >= breath.pause_interval.low() - 1e-4,
        detail: format!("held 30s, next pause {:.2}s after resume", gap),
    });

    results
}

// ── 6. Gaze ─────────────────────────────────────────────────────────────

fn validate_gaze(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Gaze Blend Shapes ---");
    let mut results = Vec::new();
    let gaze: GazeMapping = tuning.gaze;

    let mut conflicts = 0;
    let mut samples = 0;
    for p in -40..=40 {
        for y in -40..=40 {
            let q = quat_from_euler_deg(p as f32, y as f32, 0.0);
            let w = gaze.weights_for(q);
            samples += 1;
            if (w.up > 0.0 && w.down > 0.0) || (w.left > 0.0 && w.right > 0.0) {
                conflicts += 1;
            }
        }
    }
    results.push(TestResult {
        name: "gaze_opposites_exclusive".into(),
        passed: conflicts == 0,
        detail: format!("{} rotations, {} with opposing weights", samples, conflicts),
    });

    let q = quat_from_euler_deg(gaze.down_pitch * 0.5, 0.0, 0.0);
    let (pitch, _) = pitch_yaw_deg(q);
    let down = gaze.weights_for(q).down;
    results.push(TestResult {
        name: "gaze_half_down".into(),
        passed: (down - 50.0).abs() < 0.5,
        detail: format!("pitch {:.2}° → Down {:.2}", pitch, down),
    });

    results
}

// ── 7. Playback ─────────────────────────────────────────────────────────

fn validate_playback(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Blink / Twitch ---");
    let mut results = Vec::new();

    let mut engine = ExamEngine::with_tuning(tuning.clone(), 3);
    let profile = PatientProfile {
        infected: true,
        twitch_degree: TwitchDegree::Medium,
        ..PatientProfile::default()
    };
    let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, profile);
    engine.push(eye, Command::Twitch(TwitchDegree::Medium));
    engine.push(eye, Command::Blink);
    engine.update(DT);

    let started = engine.activity(eye).and_then(|a| a.started);
    results.push(TestResult {
        name: "blink_while_twitching_ignored".into(),
        passed: started == Some(PlaybackKind::Twitch(TwitchDegree::Medium)),
        detail: format!("started {:?}", started),
    });

    let mut completed_after = None;
    for i in 0..120 {
        engine.update(DT);
        if engine.activity(eye).and_then(|a| a.completed).is_some() {
            completed_after = Some(i + 1);
            break;
        }
    }
    engine.push(eye, Command::Blink);
    engine.update(DT);
    let reused = engine.activity(eye).and_then(|a| a.started) == Some(PlaybackKind::Blink);
    results.push(TestResult {
        name: "playback_frees_slot".into(),
        passed: completed_after.is_some() && reused,
        detail: format!(
            "twitch completed after {:?} steps, next blink started: {}",
            completed_after, reused
        ),
    });

    let (mut blinks, mut twitches) = (0, 0);
    for _ in 0..(60 * 60) {
        engine.update(DT);
        match engine.activity(eye).and_then(|a| a.started) {
            Some(PlaybackKind::Blink) => blinks += 1,
            Some(PlaybackKind::Twitch(_)) => twitches += 1,
            None => {}
        }
    }
    results.push(TestResult {
        name: "infected_cadence".into(),
        passed: blinks > 5 && twitches > 3,
        detail: format!("{} blinks, {} twitches in 60s", blinks, twitches),
    });

    results
}

// ── 8. Speculum ─────────────────────────────────────────────────────────

fn validate_speculum(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Speculum ---");
    let mut results = Vec::new();

    let mut engine = ExamEngine::with_tuning(tuning.clone(), 11);
    let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, PatientProfile::default());
    let tool = match engine.spawn_speculum(eye) {
        Some(t) => t,
        None => {
            results.push(TestResult {
                name: "speculum_spawn".into(),
                passed: false,
                detail: "could not link speculum to eye".into(),
            });
            return results;
        }
    };

    engine.push(tool, Command::SpeculumPickedUp);
    let mut seated_after = None;
    for i in 0..180 {
        engine.update(DT);
        if engine.speculum_state(tool) == Some(SpeculumState::OnEye) {
            seated_after = Some(i + 1);
            break;
        }
    }
    results.push(TestResult {
        name: "speculum_seats".into(),
        passed: seated_after.is_some(),
        detail: format!("on eye after {:?} steps", seated_after),
    });

    engine.push(tool, Command::SpeculumTrigger(0.75));
    engine.push(tool, Command::SpeculumPullStarted);
    for _ in 0..120 {
        engine.update(DT);
    }
    let open = engine.blend_shapes(eye).map(|w| w.get(BlendShape::Open)).unwrap_or(0.0);
    results.push(TestResult {
        name: "speculum_opens_eye".into(),
        passed: (open - 75.0).abs() < 1.0
            && engine.motion_state(eye) == Some(MotionState::Agitated),
        detail: format!("Open {:.2}, state {:?}", open, engine.motion_state(eye)),
    });

    engine.push(tool, Command::SpeculumPutDown);
    let mut idled_in_air = false;
    for _ in 0..(60 * 4) {
        engine.update(DT);
        if engine.speculum_state(tool) == Some(SpeculumState::OnAir)
            && engine.motion_state(eye) == Some(MotionState::Idling)
        {
            idled_in_air = true;
        }
    }
    let on_tray = engine.speculum_state(tool) == Some(SpeculumState::OnTray);
    results.push(TestResult {
        name: "speculum_reset".into(),
        passed: idled_in_air && on_tray,
        detail: format!("idled while lifting: {}, back on tray: {}", idled_in_air, on_tray),
    });

    // back on the tray the eye blinks again
    let mut blinked = false;
    for _ in 0..(60 * 10) {
        engine.update(DT);
        blinked |= engine.activity(eye).and_then(|a| a.started) == Some(PlaybackKind::Blink);
    }
    results.push(TestResult {
        name: "speculum_releases_animation".into(),
        passed: blinked,
        detail: format!("blinked within 10s of landing: {}", blinked),
    });

    results
}

// ── 9. Dropper ──────────────────────────────────────────────────────────

fn validate_dropper(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Eye Dropper ---");
    let mut results = Vec::new();

    let patients = [
        ("healthy", PatientProfile::default(), true),
        (
            "infected",
            PatientProfile {
                infected: true,
                ..PatientProfile::default()
            },
            false,
        ),
        (
            "infected_reactive",
            PatientProfile {
                infected: true,
                will_dilate: true,
                ..PatientProfile::default()
            },
            true,
        ),
    ];

    for (label, profile, should_dilate) in patients {
        let mut engine = ExamEngine::with_tuning(tuning.clone(), 21);
        let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, profile);
        let Some(tool) = engine.spawn_dropper(eye) else {
            results.push(TestResult {
                name: "dropper_spawn".into(),
                passed: false,
                detail: "could not aim dropper at eye".into(),
            });
            return results;
        };

        engine.push(tool, Command::DropperPickedUp);
        for _ in 0..120 {
            engine.update(DT);
        }
        let raised = engine.dropper_state(tool) == Some(DropperState::PickedUp);
        engine.push(tool, Command::DropperSqueezed);
        for _ in 0..120 {
            engine.update(DT);
        }
        let dilation = engine.pupil_dilation(eye).unwrap_or(-1.0);
        let dilated = dilation > 0.99;
        results.push(TestResult {
            name: format!("dropper_{}", label),
            passed: raised && dilated == should_dilate,
            detail: format!("raised: {}, dilation {:.2}", raised, dilation),
        });
    }

    results
}

// ── 10. Judgement ───────────────────────────────────────────────────────

fn validate_judgement(tuning: &Tuning, _verbose: bool) -> Vec<TestResult> {
    println!("--- Judgement Stamp ---");
    let mut results = Vec::new();

    let mut engine = ExamEngine::with_tuning(tuning.clone(), 5);
    let profile = PatientProfile {
        infected: true,
        people_killed: 9,
        ..PatientProfile::default()
    };
    let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, profile);
    let rest = Pose::default();
    let inspect = Pose::new(Vec3::new(0.0, 0.25, 0.35), Quat::IDENTITY);
    let card = engine.spawn_prop("id_card", rest);
    let rig = CardRig {
        card,
        rest,
        inspect,
        duration: 0.4,
    };
    let Some(stamp) = engine.spawn_stamp(eye, Some(rig)) else {
        results.push(TestResult {
            name: "stamp_spawn".into(),
            passed: false,
            detail: "could not link stamp to eye".into(),
        });
        return results;
    };

    engine.push(stamp, Command::StampLifted);
    engine.update(DT);
    engine.push(stamp, Command::Judge(Verdict::Accepted));
    engine.update(DT);
    let refused = engine.stamp_state(stamp) == Some(StampState::Lifted);
    results.push(TestResult {
        name: "stamp_waits_for_card".into(),
        passed: refused,
        detail: format!("state while card slides: {:?}", engine.stamp_state(stamp)),
    });

    for _ in 0..60 {
        engine.update(DT);
    }
    engine.push(stamp, Command::Judge(Verdict::Accepted));
    let mut outcomes = 0;
    for _ in 0..120 {
        engine.update(DT);
        outcomes += engine.judgement_outcome(stamp).is_some() as usize;
    }
    let population = engine.tally(stamp).map(|t| t.population);
    let expected = tuning.judgement.starting_population - 9;
    results.push(TestResult {
        name: "stamp_scores_once".into(),
        passed: outcomes == 1 && population == Some(expected),
        detail: format!("{} verdicts, population {:?}", outcomes, population),
    });

    let card_home = engine
        .prop_pose(card)
        .map(|p| p.position.distance(rest.position) < 1e-3)
        .unwrap_or(false);
    results.push(TestResult {
        name: "stamp_returns_card".into(),
        passed: card_home && engine.stamp_state(stamp) == Some(StampState::Resting),
        detail: format!("card home: {}, stamp {:?}", card_home, engine.stamp_state(stamp)),
    });

    results
}

// ── 11. Flicker ──────────────────────────────────────────────────────────

fn validate_flicker(tuning: &Tuning, verbose: bool) -> Vec<TestResult> {
    println!("--- Flicker Light ---");
    let mut results = Vec::new();

    let mut min_intensity = f32::MAX;
    let mut min_emission = f32::MAX;
    let (mut zaps, mut off_steps, mut steps) = (0, 0, 0);
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut light = FlickerLight::new(tuning.flicker, &mut rng);
        for _ in 0..(60 * 60) {
            let signals = light.step(DT, &mut rng);
            zaps += signals.zap as usize;
            off_steps += (!light.is_enabled()) as usize;
            steps += 1;
            min_intensity = min_intensity.min(light.intensity());
            min_emission = min_emission.min(light.emission());
        }
    }

    results.push(TestResult {
        name: "flicker_non_negative".into(),
        passed: min_intensity >= 0.0 && min_emission >= 0.0,
        detail: format!("min intensity {:.3}, min emission {:.3}", min_intensity, min_emission),
    });
    results.push(TestResult {
        name: "flicker_cycles".into(),
        passed: zaps > 0 && off_steps > 0 && off_steps < steps,
        detail: format!("{} zaps, dark {:.1}% of the time", zaps, 100.0 * off_steps as f32 / steps as f32),
    });

    if verbose {
        println!("  {} flicker steps simulated", steps);
    }

    results
}
