//! # Zero-Crossing Module
//!
//! Streaming zero-crossing detection with a hysteresis dead zone.
//!
//! Every input sample maps to exactly one output value: `1` where a
//! crossing is counted and `0` elsewhere, so the output can be windowed
//! with the same block geometry as the samples it came from.

use crate::PitchError;

/// Small offset added to the hysteresis so a zero band still ignores exact zeros.
const DEAD_ZONE_EPSILON: f32 = 1e-30;

/// Lazily flags zero crossings in a sample iterator.
pub struct ZeroCrossings<I> {
    samples: I,
    threshold: f32,
    /// Sign of the last sample seen outside the dead zone; 0 until one shows up.
    last_sign: i8,
}

impl<I: Iterator<Item = f32>> Iterator for ZeroCrossings<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let sample = self.samples.next()?;

        let sign = if sample > self.threshold {
            1
        } else if sample < -self.threshold {
            -1
        } else {
            // Inside the dead zone: never a crossing, never a state change.
            return Some(0);
        };

        let crossed = self.last_sign != 0 && sign != self.last_sign;
        self.last_sign = sign;
        Some(crossed as u8)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}

/// Flags zero crossings of `samples` with the given `hysteresis` band.
///
/// The first sample outside `[-hysteresis, hysteresis]` only sets the
/// initial sign. After that, a crossing is counted each time a sample
/// lands beyond the band on the opposite side of the last sign.
///
/// # Errors
/// * `PitchError::InvalidHysteresis` if `hysteresis` is negative or not finite
pub fn zcross<I>(samples: I, hysteresis: f32) -> Result<ZeroCrossings<I::IntoIter>, PitchError>
where
    I: IntoIterator<Item = f32>,
{
    zcross_with_sign(samples, hysteresis, 0)
}

/// Same as [`zcross`], but starts from a known `first_sign`.
///
/// A positive `first_sign` means the signal is assumed to start above
/// zero, so a first sample below the band already counts as a crossing.
/// A `first_sign` of 0 behaves like [`zcross`].
pub fn zcross_with_sign<I>(
    samples: I,
    hysteresis: f32,
    first_sign: i8,
) -> Result<ZeroCrossings<I::IntoIter>, PitchError>
where
    I: IntoIterator<Item = f32>,
{
    if !hysteresis.is_finite() || hysteresis < 0.0 {
        return Err(PitchError::InvalidHysteresis(hysteresis));
    }
    Ok(ZeroCrossings {
        samples: samples.into_iter(),
        threshold: hysteresis + DEAD_ZONE_EPSILON,
        last_sign: first_sign.signum(),
    })
}
