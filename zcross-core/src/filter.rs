//! # Filter Module
//!
//! A streaming one-pole low-pass filter. It runs before zero-crossing
//! detection to take the harmonics out of the signal, since overtones
//! add extra sign changes per cycle and push the estimate up.

use crate::PitchError;

/// One-pole IIR low-pass: `y[n] = (1 - x) * s[n] + x * y[n - 1]`, `x = exp(-cutoff)`.
#[derive(Debug, Clone)]
pub struct OnePoleLowPass {
    pole: f32,
    gain: f32,
    last: f32,
}

impl OnePoleLowPass {
    /// Creates a filter with `cutoff` in radians per sample.
    ///
    /// # Errors
    /// * `PitchError::InvalidCutoff` if the cutoff is not positive and finite
    pub fn new(cutoff: f32) -> Result<Self, PitchError> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(PitchError::InvalidCutoff(cutoff));
        }
        let pole = (-cutoff).exp();
        Ok(Self {
            pole,
            gain: 1.0 - pole,
            last: 0.0,
        })
    }

    /// Filters a single sample, keeping state for the next call.
    pub fn process(&mut self, sample: f32) -> f32 {
        self.last = self.gain * sample + self.pole * self.last;
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
    }
}

/// Lazily low-pass filters a sample iterator.
pub struct LowPass<I> {
    samples: I,
    filter: OnePoleLowPass,
}

impl<I: Iterator<Item = f32>> Iterator for LowPass<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.samples.next().map(|s| self.filter.process(s))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}

/// Wraps `samples` in a one-pole low-pass with `cutoff` in rad/sample.
pub fn lowpass<I>(samples: I, cutoff: f32) -> Result<LowPass<I::IntoIter>, PitchError>
where
    I: IntoIterator<Item = f32>,
{
    Ok(LowPass {
        samples: samples.into_iter(),
        filter: OnePoleLowPass::new(cutoff)?,
    })
}
