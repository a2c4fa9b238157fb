//! # Units Module
//!
//! Conversions between seconds, samples and frequencies for a fixed
//! sample rate. Internally every frequency is an angular frequency in
//! radians per sample, so a whole pipeline can run without knowing the
//! device rate and only convert to Hz at the edges.

use std::f32::consts::TAU;

use crate::PitchError;

/// A fixed sample rate and the unit sizes derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    samples_per_second: u32,
}

impl Rate {
    /// Creates a rate of `samples_per_second` samples per second.
    ///
    /// # Errors
    /// * `PitchError::ZeroSampleRate` if the rate is 0
    pub fn new(samples_per_second: u32) -> Result<Self, PitchError> {
        if samples_per_second == 0 {
            return Err(PitchError::ZeroSampleRate);
        }
        Ok(Self { samples_per_second })
    }

    pub fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    /// Number of samples in `seconds` seconds, truncated.
    pub fn seconds(&self, seconds: f32) -> usize {
        (seconds * self.samples_per_second as f32) as usize
    }

    /// Number of samples in `millis` milliseconds, truncated.
    pub fn millis(&self, millis: u32) -> usize {
        self.seconds(millis as f32 * 1e-3)
    }

    /// The size of 1 Hz in radians per sample.
    ///
    /// Divide an angular frequency by this to get Hz, multiply a value
    /// in Hz by it to get radians per sample.
    pub fn hz(&self) -> f32 {
        TAU / self.samples_per_second as f32
    }

    /// Converts an angular frequency (rad/sample) to Hz.
    pub fn to_hz(&self, angular: f32) -> f32 {
        angular / self.hz()
    }

    /// Converts a frequency in Hz to rad/sample.
    pub fn from_hz(&self, hz: f32) -> f32 {
        hz * self.hz()
    }
}

/// Converts a lag (samples per cycle) to an angular frequency (rad/sample).
pub fn lag_to_freq(lag: f32) -> f32 {
    TAU / lag
}

/// Converts an angular frequency (rad/sample) to a lag in samples per cycle.
pub fn freq_to_lag(freq: f32) -> f32 {
    TAU / freq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(Rate::new(0), Err(PitchError::ZeroSampleRate)));
    }

    #[test]
    fn sample_counts_follow_the_rate() {
        let rate = Rate::new(44100).unwrap();
        assert_eq!(rate.seconds(1.0), 44100);
        assert_eq!(rate.millis(200), 8820);
    }

    #[test]
    fn lag_of_100_samples_is_441_hz_at_cd_rate() {
        let rate = Rate::new(44100).unwrap();
        let hz = rate.to_hz(lag_to_freq(100.0));
        assert!((hz - 441.0).abs() < 1e-2, "got {hz}");
    }

    #[test]
    fn hz_conversion_is_reversible() {
        let rate = Rate::new(48000).unwrap();
        let angular = rate.from_hz(1000.0);
        assert!((freq_to_lag(angular) - 48.0).abs() < 1e-3);
        assert!((rate.to_hz(angular) - 1000.0).abs() < 1e-2);
    }
}
