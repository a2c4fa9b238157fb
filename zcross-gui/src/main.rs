//! # Pitch Follower GUI
//!
//! A small window showing the pitch picked up by the microphone, using
//! zero-crossing rate analysis from `zcross-core`.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application, redraws the label on a timer
//! - **Audio Thread**: `PitchWorker` capturing and estimating continuously
//! - **Communication**: a latest-value channel; the timer only ever shows
//!   the newest estimate and never waits for one

mod ui;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use iced::{self, Element, Subscription, Task, Theme};
use log::{error, info, warn};
use ui::main_display::create_main_view;
use zcross_core::{
    config::Config,
    display,
    latest::{self, Subscriber},
    note,
    worker::PitchWorker,
};

const TITLE: &str = "Pitch follower via zero-crossing rate";

/// Config file read from the working directory unless `ZCROSS_CONFIG` names another.
const DEFAULT_CONFIG_PATH: &str = "zcross.json";
const CONFIG_PATH_VAR: &str = "ZCROSS_CONFIG";

/// Main entry point for the pitch follower.
///
/// Loads the config, then runs the Iced application until the window is
/// closed. The audio worker is stopped and joined before returning.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("[MAIN] Starting pitch follower...");
    let config = load_config();

    let result = iced::application(TITLE, PitchApp::update, PitchApp::view)
        .subscription(PitchApp::subscription)
        .theme(PitchApp::theme)
        .window_size((260.0, 220.0))
        .exit_on_close_request(false)
        .run_with(move || PitchApp::new(config));
    info!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Reads the config file, falling back to defaults if it is missing or broken.
fn load_config() -> Config {
    let explicit = env::var(CONFIG_PATH_VAR).ok();
    match config_from(explicit.as_deref()) {
        Ok(config) => {
            info!("[MAIN] Using config: {:?}", config);
            config
        }
        Err(e) => {
            error!("[MAIN] Error loading config: {:#}. Using defaults.", e);
            Config::default()
        }
    }
}

/// Loads the file named by `explicit`, which must exist, or else the optional default file.
fn config_from(explicit: Option<&str>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("{} is set to {}", CONFIG_PATH_VAR, path)),
        None => Config::load_or_default(DEFAULT_CONFIG_PATH),
    }
}

/// Application message types.
#[derive(Debug, Clone)]
pub enum Message {
    /// Timer tick: pick up the newest estimate
    Tick,
    /// Close button or window close request
    Exit,
}

/// Application state shared by the timer and the view.
#[derive(Debug)]
struct PitchApp {
    update_ms: u32,
    pitches: Subscriber<String>,
    worker: Option<PitchWorker>,
    label: String,
}

impl PitchApp {
    /// Creates the state and starts the audio worker.
    ///
    /// If the worker cannot be started the window still opens and shows
    /// the "no pitch" label.
    fn new(config: Config) -> (Self, Task<Message>) {
        let initial = note::freq_to_str(0.0);
        let label = display::label_text(&initial);
        let (publisher, pitches) = latest::channel(initial);

        let update_ms = config.update_ms;
        let worker = match PitchWorker::spawn_from_mic(config, publisher) {
            Ok(worker) => {
                info!("[MAIN] Audio worker started");
                Some(worker)
            }
            Err(e) => {
                error!("[MAIN] Could not start audio worker: {:#}", e);
                None
            }
        };

        let app = Self {
            update_ms,
            pitches,
            worker,
            label,
        };
        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                let was_connected = self.pitches.is_connected();
                self.label = display::label_text(self.pitches.latest());
                if was_connected && !self.pitches.is_connected() {
                    warn!("[MAIN] Audio worker stopped publishing");
                }
                Task::none()
            }
            Message::Exit => {
                info!("[MAIN] Close requested - stopping audio worker...");
                self.stop_worker();
                iced::exit()
            }
        }
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
            info!("[MAIN] Audio worker stopped");
        }
    }

    fn audio_active(&self) -> bool {
        self.worker.is_some() && self.pitches.is_connected()
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.label, self.audio_active(), Message::Exit)
    }

    /// Redraws every `update_ms` and turns window close requests into `Exit`.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(Duration::from_millis(u64::from(self.update_ms)))
                .map(|_| Message::Tick),
            iced::window::close_requests().map(|_| Message::Exit),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;
    use zcross_core::units::Rate;

    fn app_with_source(samples: Vec<f32>, rate: u32) -> PitchApp {
        let initial = note::freq_to_str(0.0);
        let label = display::label_text(&initial);
        let (publisher, pitches) = latest::channel(initial);
        let worker = PitchWorker::spawn(
            samples.into_iter(),
            Rate::new(rate).unwrap(),
            Config::default(),
            publisher,
        )
        .unwrap();
        PitchApp {
            update_ms: 200,
            pitches,
            worker: Some(worker),
            label,
        }
    }

    #[test]
    fn starts_with_the_no_pitch_label() {
        let app = app_with_source(Vec::new(), 44100);
        assert_eq!(app.label, "\n?\n");
    }

    #[test]
    fn tick_shows_the_latest_note() {
        let samples: Vec<f32> = (0..44100 * 2)
            .map(|i| (TAU * 440.0 * (i % 44100) as f32 / 44100.0).sin())
            .collect();
        let mut app = app_with_source(samples, 44100);
        if let Some(worker) = app.worker.as_mut() {
            worker.shutdown();
        }

        let _ = app.update(Message::Tick);
        assert!(app.label.starts_with("A4\n"), "label {:?}", app.label);
    }

    #[test]
    fn explicitly_named_missing_config_is_an_error() {
        let err = config_from(Some("definitely/not/here/zcross.json")).unwrap_err();
        assert!(format!("{:#}", err).contains(CONFIG_PATH_VAR), "error {:#}", err);
    }

    #[test]
    fn explicitly_named_config_is_loaded() {
        let name = format!("zcross-gui-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, r#"{ "update_ms": 50 }"#).unwrap();
        let config = config_from(path.to_str());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap().update_ms, 50);
    }

    #[test]
    fn exit_joins_the_worker() {
        let mut app = app_with_source(vec![0.0; 44100], 44100);
        let _ = app.update(Message::Exit);
        assert!(app.worker.is_none());
    }
}
