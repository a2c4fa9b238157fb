//! # Configuration Module
//!
//! Runtime settings for the pitch follower. Everything has a default, so
//! a config file only needs the keys it changes:
//!
//! ```json
//! { "update_ms": 100, "lowpass_hz": null }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::PitchError;
use crate::pitch::{DEFAULT_HYSTERESIS, LagEstimate, PitchConfig};
use crate::units::Rate;

/// Longest accepted display refresh interval, in milliseconds.
pub const MAX_UPDATE_MS: u32 = 10_000;

/// Largest accepted block, in samples (about 47 s at 44.1 kHz).
pub const MAX_BLOCK_SIZE: usize = 1 << 21;

/// Settings for capture, estimation and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Requested input sample rate in Hz.
    pub sample_rate: u32,
    /// Display refresh interval in milliseconds, also the hop between blocks.
    pub update_ms: u32,
    /// Dead zone around zero for crossing detection, as a fraction of full scale.
    pub hysteresis: f32,
    /// Low-pass cutoff in Hz applied before detection; `None` disables the filter.
    pub lowpass_hz: Option<f32>,
    pub lag_estimate: LagEstimate,
    /// Name black keys with sharps ("C#") rather than flats ("Db").
    pub sharp_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            update_ms: 200,
            hysteresis: DEFAULT_HYSTERESIS,
            lowpass_hz: Some(400.0),
            lag_estimate: LagEstimate::Window,
            sharp_names: true,
        }
    }
}

impl Config {
    /// Loads a JSON config file, filling missing keys with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<(), PitchError> {
        self.pitch_config(self.rate()?)?;
        if let Some(cutoff) = self.lowpass_hz {
            if !cutoff.is_finite() || cutoff <= 0.0 {
                return Err(PitchError::InvalidCutoff(cutoff));
            }
        }
        Ok(())
    }

    pub fn rate(&self) -> Result<Rate, PitchError> {
        Rate::new(self.sample_rate)
    }

    /// Block geometry for `rate`: one hop per display update, blocks two hops long.
    ///
    /// `rate` may differ from `sample_rate` when the device could not
    /// provide the requested rate.
    pub fn pitch_config(&self, rate: Rate) -> Result<PitchConfig, PitchError> {
        if self.update_ms > MAX_UPDATE_MS {
            return Err(PitchError::UpdateIntervalTooLong {
                got: self.update_ms,
                max: MAX_UPDATE_MS,
            });
        }
        let hop = rate.millis(self.update_ms);
        if hop == 0 {
            return Err(PitchError::ZeroHop);
        }
        let size = hop.saturating_mul(2);
        if size > MAX_BLOCK_SIZE {
            return Err(PitchError::BlockTooLarge {
                size,
                max: MAX_BLOCK_SIZE,
            });
        }
        if !self.hysteresis.is_finite() || self.hysteresis < 0.0 {
            return Err(PitchError::InvalidHysteresis(self.hysteresis));
        }
        Ok(PitchConfig::new(size, hop)
            .with_hysteresis(self.hysteresis)
            .with_lag_estimate(self.lag_estimate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_is_two_hops_of_200_ms() {
        let config = Config::default();
        let pitch = config.pitch_config(config.rate().unwrap()).unwrap();
        assert_eq!(pitch.hop, 8820);
        assert_eq!(pitch.size, 17640);
        assert_eq!(pitch.hysteresis, 0.2);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "update_ms": 100, "lag_estimate": "crossing_span" }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.update_ms, 100);
        assert_eq!(config.lag_estimate, LagEstimate::CrossingSpan);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.lowpass_hz, Some(400.0));
    }

    #[test]
    fn null_disables_the_filter() {
        let config: Config = serde_json::from_str(r#"{ "lowpass_hz": null }"#).unwrap();
        assert_eq!(config.lowpass_hz, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_settings() {
        let zero_rate = Config { sample_rate: 0, ..Config::default() };
        assert!(matches!(zero_rate.validate(), Err(PitchError::ZeroSampleRate)));

        let zero_hop = Config { update_ms: 0, ..Config::default() };
        assert!(matches!(zero_hop.validate(), Err(PitchError::ZeroHop)));

        let bad_cutoff = Config { lowpass_hz: Some(-5.0), ..Config::default() };
        assert!(matches!(bad_cutoff.validate(), Err(PitchError::InvalidCutoff(_))));

        let bad_hysteresis = Config { hysteresis: -0.1, ..Config::default() };
        assert!(matches!(bad_hysteresis.validate(), Err(PitchError::InvalidHysteresis(_))));
    }

    #[test]
    fn oversized_geometry_is_an_error_not_an_allocation() {
        let forever = Config { update_ms: u32::MAX, ..Config::default() };
        assert_eq!(
            forever.validate(),
            Err(PitchError::UpdateIntervalTooLong { got: u32::MAX, max: MAX_UPDATE_MS })
        );

        let huge_rate = Config { sample_rate: u32::MAX, ..Config::default() };
        assert!(matches!(huge_rate.validate(), Err(PitchError::BlockTooLarge { .. })));

        let longest = Config { update_ms: MAX_UPDATE_MS, ..Config::default() };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("definitely/not/here/zcross.json").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_from_disk() {
        let name = format!("zcross-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        fs::write(&path, r#"{ "sample_rate": 48000, "sharp_names": false }"#).unwrap();
        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert!(!config.sharp_names);
    }
}
