//! Command-line and environment configuration

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::resolver::DEFAULT_INSTANCE;
use crate::session::SessionConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    /// Advance a clock without producing sound
    #[default]
    Simulated,
    /// Play through the default audio device (needs the `rodio-output` feature)
    Rodio,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "tubeplay", version, about = "Ad-free audio player for video hosting platforms")]
pub struct Config {
    /// Base URL of a Piped-compatible API instance
    #[arg(long, env = "TUBEPLAY_INSTANCE", default_value = DEFAULT_INSTANCE)]
    pub instance: String,

    /// Directory for rolling log files
    #[arg(long, env = "TUBEPLAY_LOG_DIR", default_value = ".logs")]
    pub log_dir: PathBuf,

    /// Audio output backend
    #[arg(long, env = "TUBEPLAY_OUTPUT", value_enum, default_value_t = OutputKind::Simulated)]
    pub output: OutputKind,

    /// Initial playback speed, clamped to 0.5..=2.0
    #[arg(long, env = "TUBEPLAY_SPEED", default_value_t = 1.0)]
    pub speed: f64,

    /// Search to run on start-up
    pub query: Option<String>,
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initial_speed: self.speed,
            ..SessionConfig::default()
        }
    }
}
