//! Run settings, loadable from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::{
    ShiftParams, DEFAULT_NOISE_LEVEL, DEFAULT_PITCH_SEMITONES, DEFAULT_TEMPO_PERCENT,
    REFERENCE_SAMPLE_RATE,
};
use crate::error::AnonymizeError;
use crate::noise::validate_noise_level;

/// Default input file name.
pub const DEFAULT_INPUT: &str = "input.wav";
/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "output_anonymized.wav";

/// Which sample rate the shifting engine runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    /// Use the rate declared by the input file.
    #[default]
    Input,
    /// Always use [`REFERENCE_SAMPLE_RATE`], whatever the input declares.
    Fixed,
}

impl RateMode {
    /// Engine rate for an input declared at `input_rate`.
    pub fn processing_rate(self, input_rate: u32) -> u32 {
        match self {
            RateMode::Input => input_rate,
            RateMode::Fixed => REFERENCE_SAMPLE_RATE,
        }
    }
}

/// Everything one anonymization run needs.
///
/// Missing fields in a settings file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Pitch shift in semitones.
    pub pitch_semitones: f64,
    /// Tempo change in percent.
    pub tempo_percent: f64,
    /// Noise amplitude as a fraction of full scale.
    pub noise_level: f32,
    /// Seed for the noise generator; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub rate_mode: RateMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            pitch_semitones: DEFAULT_PITCH_SEMITONES,
            tempo_percent: DEFAULT_TEMPO_PERCENT,
            noise_level: DEFAULT_NOISE_LEVEL,
            seed: None,
            rate_mode: RateMode::Input,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnonymizeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AnonymizeError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| AnonymizeError::Config {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Pitch and tempo part of the settings.
    pub fn shift_params(&self) -> ShiftParams {
        ShiftParams::new(self.pitch_semitones, self.tempo_percent)
    }

    /// Checks every numeric setting.
    pub fn validate(&self) -> Result<(), AnonymizeError> {
        self.shift_params().validate()?;
        validate_noise_level(self.noise_level)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        // Settings only hold plain numbers, paths and enums.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
