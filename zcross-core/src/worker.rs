//! # Pitch Worker Module
//!
//! Runs the estimation chain on a dedicated thread:
//! samples -> low-pass -> zero-crossing pitch -> Hz -> note name,
//! publishing every note name to a [`latest`](crate::latest) channel.
//!
//! The loop checks its [`CancelToken`] between pulls. A pull blocks on
//! the sample source (the microphone, usually), so shutdown waits for
//! the current block to complete. The loop also ends when the source
//! ends or the subscriber is dropped.

use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::PitchError;
use crate::audio;
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::filter::lowpass;
use crate::latest::Publisher;
use crate::note::{freq_to_midi, midi_to_str};
use crate::pitch::{PitchEstimate, hz_or_zero, zcross_pitch};
use crate::units::Rate;

/// Handle to the estimation thread.
///
/// Dropping the handle cancels the worker and waits for it.
#[derive(Debug)]
pub struct PitchWorker {
    cancel: CancelToken,
    thread_handle: Option<JoinHandle<()>>,
}

impl PitchWorker {
    /// Runs the chain over `samples` recorded at `rate`.
    ///
    /// # Errors
    /// * if `config` is unusable at `rate`
    /// * if the thread cannot be spawned
    pub fn spawn<S>(
        samples: S,
        rate: Rate,
        config: Config,
        publisher: Publisher<String>,
    ) -> Result<Self>
    where
        S: Iterator<Item = f32> + Send + 'static,
    {
        config.validate()?;
        config.pitch_config(rate)?;

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let thread_handle = thread::Builder::new()
            .name("zcross-worker".into())
            .spawn(move || {
                if let Err(e) = run_pipeline(samples, rate, &config, &publisher, &worker_cancel) {
                    error!("[WORKER] Pipeline failed: {}", e);
                }
            })
            .context("Failed to spawn pitch worker thread")?;

        Ok(Self {
            cancel,
            thread_handle: Some(thread_handle),
        })
    }

    /// Opens the default microphone on a new thread and runs the chain over it.
    ///
    /// The stream is created inside the thread since it cannot be moved
    /// between threads on every platform. Device errors are logged and end
    /// the worker, which the subscriber sees as a disconnect.
    pub fn spawn_from_mic(config: Config, publisher: Publisher<String>) -> Result<Self> {
        config.validate()?;

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let thread_handle = thread::Builder::new()
            .name("zcross-audio".into())
            .spawn(move || {
                info!("[AUDIO-THREAD] Starting audio thread...");
                let capture = match audio::open_microphone(config.sample_rate) {
                    Ok(capture) => capture,
                    Err(e) => {
                        error!("[AUDIO-THREAD] Fatal Error starting audio: {:#}", e);
                        return;
                    }
                };

                let result = Rate::new(capture.sample_rate).and_then(|rate| {
                    run_pipeline(capture.samples, rate, &config, &publisher, &worker_cancel)
                });
                if let Err(e) = result {
                    error!("[AUDIO-THREAD] Pipeline failed: {}", e);
                }

                info!("[AUDIO-THREAD] Stopping stream and exiting...");
                drop(capture.stream);
                info!("[AUDIO-THREAD] Audio thread finished");
            })
            .context("Failed to spawn audio thread")?;

        Ok(Self {
            cancel,
            thread_handle: Some(thread_handle),
        })
    }

    /// Whether the worker thread has exited, by cancellation or because its source ended.
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }

    /// Cancels the worker and blocks until its thread has exited.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.thread_handle.take() {
            info!("[WORKER] Waiting for worker thread to finish...");
            if handle.join().is_err() {
                error!("[WORKER] Worker thread panicked");
            }
        }
    }
}

impl Drop for PitchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds the chain over `samples` and publishes until cancelled or the source ends.
fn run_pipeline<S>(
    samples: S,
    rate: Rate,
    config: &Config,
    publisher: &Publisher<String>,
    cancel: &CancelToken,
) -> Result<(), PitchError>
where
    S: Iterator<Item = f32>,
{
    let pitch_config = config.pitch_config(rate)?;
    info!(
        "[WORKER] Estimating at {} Hz, block {} samples, hop {} samples",
        rate.samples_per_second(),
        pitch_config.size,
        pitch_config.hop
    );

    let sharp = config.sharp_names;
    let published = match config.lowpass_hz {
        Some(cutoff) => {
            let filtered = lowpass(samples, rate.from_hz(cutoff))?;
            let estimates = zcross_pitch(filtered, pitch_config)?;
            publish_estimates(estimates, rate, sharp, publisher, cancel)
        }
        None => {
            let estimates = zcross_pitch(samples, pitch_config)?;
            publish_estimates(estimates, rate, sharp, publisher, cancel)
        }
    };

    info!("[WORKER] Published {} estimates", published);
    Ok(())
}

fn publish_estimates<I>(
    mut estimates: I,
    rate: Rate,
    sharp_names: bool,
    publisher: &Publisher<String>,
    cancel: &CancelToken,
) -> usize
where
    I: Iterator<Item = PitchEstimate>,
{
    let mut published = 0;
    while !cancel.is_cancelled() {
        let Some(estimate) = estimates.next() else {
            warn!("[WORKER] Sample source ended");
            break;
        };
        let hz = hz_or_zero(estimate, &rate);
        if !publisher.publish(midi_to_str(freq_to_midi(hz), sharp_names)) {
            info!("[WORKER] Display went away, stopping");
            break;
        }
        published += 1;
    }
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MicSamples;
    use crate::latest;
    use crate::note::UNKNOWN_NOTE;
    use std::f32::consts::TAU;
    use std::time::Duration;

    /// Runs `shutdown` on a helper thread and reports whether it returned within `limit`.
    fn shutdown_within(mut worker: PitchWorker, limit: Duration) -> bool {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            worker.shutdown();
            let _ = done_tx.send(());
        });
        done_rx.recv_timeout(limit).is_ok()
    }

    fn sine(freq_hz: f32, rate: u32) -> impl Iterator<Item = f32> + Send + 'static {
        (0u64..).map(move |i| (TAU * freq_hz * (i % rate as u64) as f32 / rate as f32).sin())
    }

    #[test]
    fn publishes_the_note_of_a_finite_source() {
        let (tx, mut rx) = latest::channel(UNKNOWN_NOTE.to_string());
        let rate = Rate::new(44100).unwrap();
        let samples = sine(440.0, 44100).take(44100 * 2);

        let mut worker = PitchWorker::spawn(samples, rate, Config::default(), tx).unwrap();
        worker.shutdown();

        assert!(rx.latest().starts_with("A4"), "got {}", rx.latest());
    }

    #[test]
    fn silence_is_published_as_unknown() {
        let (tx, mut rx) = latest::channel(String::new());
        let rate = Rate::new(8000).unwrap();
        let samples = std::iter::repeat(0.0f32).take(8000);

        let mut worker = PitchWorker::spawn(samples, rate, Config::default(), tx).unwrap();
        worker.shutdown();

        assert_eq!(rx.latest(), UNKNOWN_NOTE);
    }

    #[test]
    fn cancellation_stops_an_endless_source() {
        let (tx, mut rx) = latest::channel(String::new());
        let rate = Rate::new(44100).unwrap();
        let config = Config { update_ms: 20, ..Config::default() };

        let mut worker = PitchWorker::spawn(sine(220.0, 44100), rate, config, tx).unwrap();
        while rx.latest().is_empty() {
            std::thread::yield_now();
        }
        worker.shutdown();

        assert!(worker.is_finished());
        rx.latest();
        rx.latest();
        assert!(!rx.is_connected());
    }

    #[test]
    fn device_error_ends_the_worker_and_shutdown_returns() {
        let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (err_tx, err_rx) = crossbeam_channel::bounded(1);
        let (tx, _rx) = latest::channel(String::new());
        let rate = Rate::new(44100).unwrap();
        let samples = MicSamples::new(chunk_rx).with_errors(err_rx);

        let worker = PitchWorker::spawn(samples, rate, Config::default(), tx).unwrap();
        // The chunk sender stays alive, as it does inside a failed cpal stream.
        err_tx.send(cpal::StreamError::DeviceNotAvailable).unwrap();

        assert!(shutdown_within(worker, Duration::from_secs(2)));
        drop(chunk_tx);
    }

    #[test]
    fn silent_device_does_not_block_shutdown() {
        let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (tx, _rx) = latest::channel(String::new());
        let rate = Rate::new(44100).unwrap();
        let samples = MicSamples::new(chunk_rx).with_stall_timeout(Duration::from_millis(100));

        let worker = PitchWorker::spawn(samples, rate, Config::default(), tx).unwrap();

        assert!(shutdown_within(worker, Duration::from_secs(2)));
        drop(chunk_tx);
    }

    #[test]
    fn dropped_display_stops_the_worker() {
        let (tx, rx) = latest::channel(String::new());
        let rate = Rate::new(44100).unwrap();
        let worker = PitchWorker::spawn(sine(330.0, 44100), rate, Config::default(), tx).unwrap();
        drop(rx);

        let started = std::time::Instant::now();
        while !worker.is_finished() {
            assert!(started.elapsed() < Duration::from_secs(5), "worker kept running");
            std::thread::yield_now();
        }
    }

    #[test]
    fn invalid_config_fails_before_spawning() {
        let (tx, _rx) = latest::channel(String::new());
        let rate = Rate::new(44100).unwrap();
        let config = Config { hysteresis: f32::NAN, ..Config::default() };
        assert!(PitchWorker::spawn(std::iter::empty(), rate, config, tx).is_err());
    }
}
