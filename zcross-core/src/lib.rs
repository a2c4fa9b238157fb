// zcross-core/src/lib.rs

//! The core logic for the zero-crossing pitch follower.
//! This crate is responsible for audio capture, filtering, zero-crossing
//! pitch estimation and note naming. It is completely headless
//! and contains no GUI code.
//!
//! ```
//! use zcross_core::pitch::{LagEstimate, PitchConfig, hz_or_zero, zcross_pitch};
//! use zcross_core::units::Rate;
//!
//! let rate = Rate::new(44100).unwrap();
//! let sinusoid_440hz = (0..44100)
//!     .map(|i| (i as f32 / 44100.0 * 440.0 * std::f32::consts::TAU).sin());
//!
//! let config = PitchConfig::new(2048, 1024).with_lag_estimate(LagEstimate::CrossingSpan);
//! for estimate in zcross_pitch(sinusoid_440hz, config).unwrap() {
//!     assert!((hz_or_zero(estimate, &rate) - 440.0).abs() < 5.0);
//! }
//! ```

use thiserror::Error;

pub mod audio;
pub mod blocks;
pub mod cancel;
pub mod config;
pub mod display;
pub mod filter;
pub mod latest;
pub mod note;
pub mod pitch;
pub mod units;
pub mod worker;
pub mod zcross;

/// Invalid parameters for the estimation chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PitchError {
    #[error("sample rate must be greater than 0")]
    ZeroSampleRate,
    #[error("block size must be greater than 0")]
    ZeroBlockSize,
    #[error("hop must be greater than 0 samples")]
    ZeroHop,
    #[error("hysteresis must be finite and non-negative, got {0}")]
    InvalidHysteresis(f32),
    #[error("low-pass cutoff must be finite and positive, got {0}")]
    InvalidCutoff(f32),
    #[error("update interval must be at most {max} ms, got {got}")]
    UpdateIntervalTooLong { got: u32, max: u32 },
    #[error("block of {size} samples exceeds the limit of {max}")]
    BlockTooLarge { size: usize, max: usize },
}
