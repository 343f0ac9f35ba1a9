use crate::error::{AudioError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ducking configuration
///
/// Timings are in seconds, levels in dB relative to full scale. Missing
/// fields in a TOML file fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckSettings {
    /// How long the envelope takes to reach full depth
    pub attack_secs: f64,
    /// How long the envelope takes to fall back to zero
    pub release_secs: f64,
    /// How long the voice must stay quiet before it counts as silence
    pub silence_secs: f64,
    /// Voice level above which the primary is ducked
    pub threshold_db: f64,
    /// Maximum attenuation applied to the primary
    pub ratio_db: f64,
    /// Silent samples placed in front of the voice before reading starts
    pub pre_roll_samples: usize,
    /// Extra gain applied to the samples rewound when silence is confirmed
    pub trim_gain_db: f64,
}

impl Default for DuckSettings {
    fn default() -> Self {
        Self {
            attack_secs: 0.2,
            release_secs: 1.3,
            silence_secs: 0.4,
            threshold_db: -30.0,
            ratio_db: 15.0,
            pre_roll_samples: 9600,
            trim_gain_db: -15.0,
        }
    }
}

impl DuckSettings {
    /// Create settings with custom timings and levels, default pre-roll and trim
    pub fn new(
        attack_secs: f64,
        release_secs: f64,
        silence_secs: f64,
        threshold_db: f64,
        ratio_db: f64,
    ) -> Self {
        Self {
            attack_secs,
            release_secs,
            silence_secs,
            threshold_db,
            ratio_db,
            ..Default::default()
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(text).context("Failed to parse duck settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid duck settings in {}", path.display()))
    }

    /// Reject timings that are not strictly positive and levels that are not finite
    pub fn validate(&self) -> Result<()> {
        let timings = [
            ("attack", self.attack_secs),
            ("release", self.release_secs),
            ("silence", self.silence_secs),
        ];
        for (name, value) in timings {
            if !(value.is_finite() && value > 0.0) {
                return Err(AudioError::InvalidParameter { name, value });
            }
        }

        let levels = [
            ("threshold", self.threshold_db),
            ("ratio", self.ratio_db),
            ("trim_gain", self.trim_gain_db),
        ];
        for (name, value) in levels {
            if !value.is_finite() {
                return Err(AudioError::InvalidParameter { name, value });
            }
        }

        Ok(())
    }
}
