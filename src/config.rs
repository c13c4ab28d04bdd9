//! Configuration and CLI argument handling

use clap::Parser;

use crate::services::{ALARM_PATTERN_MS, ALARM_SOUND_URI};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "pocket-timer")]
#[command(about = "Stopwatch and countdown timers with alarm sound and vibration")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Alarm sound played by the stopwatch mark and countdown expiry (URL or path)
    #[arg(long, default_value = ALARM_SOUND_URI)]
    pub alarm_sound: String,

    /// Sound played by the welcome screen (URL or path)
    #[arg(long, default_value = "assets/welcome.mp3")]
    pub welcome_sound: String,

    /// Alarm vibration pattern in milliseconds, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = ALARM_PATTERN_MS.to_vec())]
    pub vibration_pattern: Vec<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
