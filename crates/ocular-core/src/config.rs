//! Tuning file loading.
//!
//! The whole exam room is tuned from one JSON document. Every section and
//! every field is optional; anything left out keeps its default.

use std::io::Read;
use std::path::Path;

use ocular_logic::blend_shapes::GazeMapping;
use ocular_logic::breath::BreathTuning;
use ocular_logic::cadence::CadenceTuning;
use ocular_logic::dropper::DropperTuning;
use ocular_logic::flicker::FlickerTuning;
use ocular_logic::judgement::JudgementTuning;
use ocular_logic::motion::MotionTuning;
use ocular_logic::playback::ClipLibrary;
use ocular_logic::speculum::SpeculumTuning;
use ocular_logic::tuning::TuningError;
use serde::{Deserialize, Serialize};

/// All tunable parameters for an exam room.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub motion: MotionTuning,
    pub breath: BreathTuning,
    pub gaze: GazeMapping,
    pub cadence: CadenceTuning,
    pub clips: ClipLibrary,
    pub speculum: SpeculumTuning,
    pub dropper: DropperTuning,
    pub judgement: JudgementTuning,
    pub flicker: FlickerTuning,
}

impl Tuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        self.motion.validate()?;
        self.breath.validate()?;
        self.cadence.validate()?;
        self.speculum.validate()?;
        self.dropper.validate()?;
        self.judgement.validate()?;
        self.flicker.validate()
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }
}

/// Load tuning from a reader
pub fn read_tuning<R: Read>(reader: R) -> Result<Tuning, ConfigError> {
    let tuning: Tuning = serde_json::from_reader(reader)?;
    tuning.validate()?;
    Ok(tuning)
}

/// Load tuning from a file on disk
pub fn load_tuning<P: AsRef<Path>>(path: P) -> Result<Tuning, ConfigError> {
    let file = std::fs::File::open(path.as_ref())?;
    let tuning = read_tuning(std::io::BufReader::new(file))?;
    log::info!("Loaded tuning from {}", path.as_ref().display());
    Ok(tuning)
}

/// Errors that can occur while loading tuning
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<TuningError> for ConfigError {
    fn from(e: TuningError) -> Self {
        ConfigError::Invalid {
            field: e.field,
            reason: e.reason,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Tuning parse error: {}", e),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid tuning value for {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocular_logic::motion::SaccadeProfile;

    #[test]
    fn test_empty_document_is_default() {
        let tuning = Tuning::from_json("{}").map_err(|e| e.to_string());
        assert_eq!(tuning, Ok(Tuning::default()));
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "motion": { "agitated": { "saccade_speed": 1200.0 } },
                        "breath": { "base_frequency": 0.5 } }"#;
        let tuning = match Tuning::from_json(json) {
            Ok(t) => t,
            Err(e) => panic!("parse failed: {}", e),
        };
        assert_eq!(tuning.motion.agitated.saccade_speed, 1200.0);
        // untouched fields in a touched section keep their defaults
        assert_eq!(
            tuning.motion.agitated.micro_range,
            MotionTuning::default().agitated.micro_range
        );
        assert_eq!(tuning.breath.base_frequency, 0.5);
        assert_eq!(tuning.flicker, FlickerTuning::default());
    }

    #[test]
    fn test_partial_agitated_section_keeps_agitated_defaults() {
        let json = r#"{ "motion": { "agitated": { "saccade_speed": 1200.0 } } }"#;
        let tuning = match Tuning::from_json(json) {
            Ok(t) => t,
            Err(e) => panic!("parse failed: {}", e),
        };
        let expected = SaccadeProfile {
            saccade_speed: 1200.0,
            ..SaccadeProfile::agitated()
        };
        assert_eq!(tuning.motion.agitated, expected);
        assert_eq!(tuning.motion.idle, SaccadeProfile::idle());
    }

    #[test]
    fn test_partial_idle_section_keeps_idle_defaults() {
        let json = r#"{ "motion": { "idle": { "micro_range": 0.9 } } }"#;
        let tuning = match Tuning::from_json(json) {
            Ok(t) => t,
            Err(e) => panic!("parse failed: {}", e),
        };
        assert_eq!(tuning.motion.idle.micro_range, 0.9);
        assert_eq!(
            tuning.motion.idle.correction_interval,
            SaccadeProfile::idle().correction_interval
        );
        assert_eq!(tuning.motion.agitated, SaccadeProfile::agitated());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let json = r#"{ "speculum": { "reset_speed": -3.0 } }"#;
        match Tuning::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "speculum.reset_speed"),
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_sections() {
        let json = r#"{ "dropper": { "drop_speed": 0.9 },
                        "judgement": { "starting_population": 120 } }"#;
        let tuning = match Tuning::from_json(json) {
            Ok(t) => t,
            Err(e) => panic!("parse failed: {}", e),
        };
        assert_eq!(tuning.dropper.drop_speed, 0.9);
        assert_eq!(
            tuning.dropper.rise_duration,
            DropperTuning::default().rise_duration
        );
        assert_eq!(tuning.judgement.starting_population, 120);

        let bad = r#"{ "judgement": { "press_duration": -1.0 } }"#;
        assert!(matches!(
            Tuning::from_json(bad),
            Err(ConfigError::Invalid { field: "judgement.press_duration", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_tuning("/definitely/not/here/tuning.json");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_read_from_bytes() {
        let json = br#"{ "cadence": { "human_blink_cooldown": { "min": 1.0, "max": 2.0 } } }"#;
        let tuning = read_tuning(&json[..]).map_err(|e| e.to_string());
        assert_eq!(
            tuning.map(|t| t.cadence.human_blink_cooldown.high()),
            Ok(2.0)
        );
    }
}
