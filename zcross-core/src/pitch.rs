//! # Pitch Detection Module
//!
//! Zero-crossing rate pitch estimation over a live sample stream.
//!
//! The samples are turned into a per-sample crossing flag sequence
//! (see [`crate::zcross`]), which is then split into blocks. One
//! estimate comes out of each block:
//! - no crossings: `None`, the "no pitch" sentinel (shown as 0 Hz)
//! - otherwise: two crossings make a cycle, so the lag is
//!   `2 * size / crossings` samples and the frequency is its reciprocal
//!
//! Estimates are angular frequencies in radians per sample; convert them
//! with [`Rate::to_hz`](crate::units::Rate::to_hz).

use serde::{Deserialize, Serialize};

use crate::PitchError;
use crate::blocks::{self, Blocks};
use crate::units::{Rate, lag_to_freq};
use crate::zcross::{self, ZeroCrossings};

/// Dead zone around zero, as a fraction of full scale.
pub const DEFAULT_HYSTERESIS: f32 = 0.2;

/// One estimate per block, in rad/sample. `None` means no crossing was seen.
pub type PitchEstimate = Option<f32>;

/// How the lag is derived from the crossings in a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagEstimate {
    /// `2 * size / crossings`: the crossing rate over the whole block.
    ///
    /// Off by up to `rate / (2 * size)` Hz since crossings are whole numbers.
    #[default]
    Window,
    /// `2 * (last - first) / (crossings - 1)`: the distance between the
    /// first and last crossing in the block. Falls back to `Window` when
    /// the block holds a single crossing.
    CrossingSpan,
}

/// Block geometry and detector settings for [`zcross_pitch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchConfig {
    pub size: usize,
    pub hop: usize,
    pub hysteresis: f32,
    pub lag_estimate: LagEstimate,
}

impl PitchConfig {
    /// `size`-sample blocks every `hop` samples, default hysteresis and lag estimate.
    pub fn new(size: usize, hop: usize) -> Self {
        Self {
            size,
            hop,
            hysteresis: DEFAULT_HYSTERESIS,
            lag_estimate: LagEstimate::Window,
        }
    }

    pub fn with_hysteresis(mut self, hysteresis: f32) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    pub fn with_lag_estimate(mut self, lag_estimate: LagEstimate) -> Self {
        self.lag_estimate = lag_estimate;
        self
    }
}

/// Lazy sequence of pitch estimates, one per block.
pub struct ZcrossPitch<I: Iterator<Item = f32>> {
    blocks: Blocks<ZeroCrossings<I>>,
    size: usize,
    lag_estimate: LagEstimate,
}

impl<I: Iterator<Item = f32>> Iterator for ZcrossPitch<I> {
    type Item = PitchEstimate;

    fn next(&mut self) -> Option<PitchEstimate> {
        let block = self.blocks.next()?;
        Some(estimate_block(&block, self.size, self.lag_estimate))
    }
}

/// Builds the estimator over `samples`.
///
/// Nothing is pulled from `samples` until the first estimate is requested.
///
/// # Errors
/// * any `PitchError` from an invalid block geometry or hysteresis
pub fn zcross_pitch<I>(
    samples: I,
    config: PitchConfig,
) -> Result<ZcrossPitch<I::IntoIter>, PitchError>
where
    I: IntoIterator<Item = f32>,
{
    let crossings = zcross::zcross(samples, config.hysteresis)?;
    Ok(ZcrossPitch {
        blocks: blocks::blocks(crossings, config.size, config.hop)?,
        size: config.size,
        lag_estimate: config.lag_estimate,
    })
}

/// Estimates the pitch of one block of crossing flags.
fn estimate_block(flags: &[u8], size: usize, lag_estimate: LagEstimate) -> PitchEstimate {
    let mut crossings = 0usize;
    let mut first = 0usize;
    let mut last = 0usize;
    for (i, _) in flags.iter().enumerate().filter(|(_, f)| **f != 0) {
        if crossings == 0 {
            first = i;
        }
        last = i;
        crossings += 1;
    }

    if crossings == 0 {
        return None;
    }

    let lag = match lag_estimate {
        LagEstimate::CrossingSpan if crossings > 1 => {
            2.0 * (last - first) as f32 / (crossings - 1) as f32
        }
        _ => 2.0 * size as f32 / crossings as f32,
    };
    Some(lag_to_freq(lag))
}

/// Converts an estimate to Hz, mapping "no pitch" to the 0 Hz sentinel.
pub fn hz_or_zero(estimate: PitchEstimate, rate: &Rate) -> f32 {
    estimate.map_or(0.0, |angular| rate.to_hz(angular))
}
