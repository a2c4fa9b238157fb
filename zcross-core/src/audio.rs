//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! The rest of the crate only sees the microphone as an endless sequence
//! of `f32` samples: [`MicSamples`] blocks on the capture channel and
//! ends when the capture side goes away, reports a stream error or
//! stalls for longer than [`STALL_TIMEOUT`].
//!
//! ## Features
//! - Automatic audio device selection
//! - Mono f32 input, or the first channel of a multi-channel device
//! - Sample rate as close as the device allows to the requested one

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};

/// A capture that delivers nothing for this long is treated as a dead device.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// A running input stream and the samples it produces.
///
/// Dropping this stops the capture.
pub struct MicCapture {
    pub stream: cpal::Stream,
    pub samples: MicSamples,
    pub sample_rate: u32,
}

/// Opens the default input device and starts recording.
pub fn open_microphone(target_rate: u32) -> Result<MicCapture> {
    let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
    let (stream_err_tx, stream_err_rx) = crossbeam_channel::bounded::<cpal::StreamError>(1);
    let (stream, sample_rate) = start_audio_capture(raw_audio_tx, stream_err_tx, target_rate)?;
    Ok(MicCapture {
        stream,
        samples: MicSamples::new(raw_audio_rx).with_errors(stream_err_rx),
        sample_rate,
    })
}

/// Starts audio capture from the default input device.
///
/// Every callback's worth of mono samples is sent through `sender` as one chunk.
/// Stream errors are logged and forwarded through `errors`.
///
/// # Arguments
/// * `sender` - Channel sender for streaming audio chunks to the estimator
/// * `errors` - Channel sender for stream errors reported by the device
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the rate actually used
/// * `Err(e)` - Error if no device or no usable f32 format is available
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    errors: Sender<cpal::StreamError>,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("[AUDIO] Using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("Failed to query input configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate_val = clamp_rate(&supported_config, target_rate);
    let channels = (supported_config.channels() as usize).max(1);
    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate_val))
        .into();

    info!("[AUDIO] Selected sample rate: {} Hz, {} channel(s)", sample_rate_val, channels);

    let err_fn = move |err: cpal::StreamError| {
        error!("[AUDIO] An error occurred on the audio stream: {}", err);
        // One pending error is enough to end the sample sequence.
        let _ = errors.try_send(err);
    };

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // take only samples from the first channel
            let chunk: Vec<f32> = data.iter().step_by(channels).copied().collect();
            // A closed channel means the reader is gone; the stream is about to be dropped.
            let _ = sender.send(chunk);
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float formats are considered. Mono is preferred, then the
/// range closest to the target rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_diff = clamp_rate(c, target_rate).abs_diff(target_rate);
            (c.channels() != 1, rate_diff)
        })
}

/// The supported rate of `config` closest to `target_rate`.
fn clamp_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

/// Blocking iterator over the samples of a chunked capture channel.
///
/// Yields samples in arrival order. The sequence ends when
/// - the sending side is dropped and every received chunk has been drained
/// - a stream error arrives on the error channel
/// - no chunk arrives within the stall timeout
pub struct MicSamples {
    chunks: Receiver<Vec<f32>>,
    errors: Receiver<cpal::StreamError>,
    stall_timeout: Duration,
    current: std::vec::IntoIter<f32>,
    ended: bool,
}

impl MicSamples {
    pub fn new(chunks: Receiver<Vec<f32>>) -> Self {
        Self {
            chunks,
            errors: crossbeam_channel::never(),
            stall_timeout: STALL_TIMEOUT,
            current: Vec::new().into_iter(),
            ended: false,
        }
    }

    /// Ends the sequence as soon as a stream error shows up on `errors`.
    pub fn with_errors(mut self, errors: Receiver<cpal::StreamError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    /// Waits for the next chunk, or `None` once the capture is over.
    fn next_chunk(&self) -> Option<Vec<f32>> {
        crossbeam_channel::select! {
            recv(self.chunks) -> chunk => chunk.ok(),
            recv(self.errors) -> err => {
                match err {
                    Ok(err) => warn!("[AUDIO] Ending sample stream after device error: {}", err),
                    Err(_) => warn!("[AUDIO] Ending sample stream: error channel closed"),
                }
                None
            },
            default(self.stall_timeout) => {
                warn!("[AUDIO] No audio for {:?}, ending sample stream", self.stall_timeout);
                None
            },
        }
    }
}

impl Iterator for MicSamples {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        loop {
            if let Some(sample) = self.current.next() {
                return Some(sample);
            }
            if self.ended {
                return None;
            }
            match self.next_chunk() {
                Some(chunk) => self.current = chunk.into_iter(),
                None => {
                    self.ended = true;
                    return None;
                }
            }
        }
    }
}
