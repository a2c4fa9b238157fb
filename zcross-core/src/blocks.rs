//! # Blocks Module
//!
//! Sliding windows over a lazily produced sequence.

use std::collections::VecDeque;

use crate::PitchError;

/// Upper bound on the window buffer reserved up front; larger windows grow as they fill.
const INITIAL_CAPACITY: usize = 4096;

/// Iterator over fixed-size windows of an underlying iterator.
///
/// Windows are `size` elements long and start `hop` elements apart.
/// Only complete windows are yielded; a trailing partial window is dropped.
pub struct Blocks<I: Iterator> {
    items: I,
    size: usize,
    hop: usize,
    window: VecDeque<I::Item>,
    /// Elements to discard before the next window starts filling (hop > size).
    pending_skip: usize,
}

impl<I> Iterator for Blocks<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending_skip > 0 {
            self.items.next()?;
            self.pending_skip -= 1;
        }

        while self.window.len() < self.size {
            self.window.push_back(self.items.next()?);
        }

        let block: Vec<I::Item> = self.window.iter().cloned().collect();

        if self.hop >= self.size {
            self.window.clear();
            self.pending_skip = self.hop - self.size;
        } else {
            self.window.drain(..self.hop);
        }

        Some(block)
    }
}

/// Splits `items` into windows of `size` elements, `hop` elements apart.
///
/// With a finite input of `n` elements this yields
/// `(n - size) / hop + 1` windows, or none at all when `n < size`.
///
/// # Errors
/// * `PitchError::ZeroBlockSize` if `size` is 0
/// * `PitchError::ZeroHop` if `hop` is 0
pub fn blocks<I>(items: I, size: usize, hop: usize) -> Result<Blocks<I::IntoIter>, PitchError>
where
    I: IntoIterator,
{
    if size == 0 {
        return Err(PitchError::ZeroBlockSize);
    }
    if hop == 0 {
        return Err(PitchError::ZeroHop);
    }
    Ok(Blocks {
        items: items.into_iter(),
        size,
        hop,
        window: VecDeque::with_capacity(size.min(INITIAL_CAPACITY)),
        pending_skip: 0,
    })
}
