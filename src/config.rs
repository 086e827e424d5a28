//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::state::Settings;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "profile-autopilot")]
#[command(about = "Timed profile activities with a reconciled activity view and saved templates")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding saved templates
    #[arg(long, default_value = "templates.json")]
    pub data_file: PathBuf,

    /// Keep templates in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Seconds added by "extend" when the request names none
    #[arg(long, default_value = "10")]
    pub extend_step: u64,

    /// Countdown tick period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Display name of the simulated profile
    #[arg(long, default_value = "Player")]
    pub persona: String,

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

    pub fn settings(&self) -> Settings {
        Settings {
            extend_step: Duration::from_secs(self.extend_step),
            tick: Duration::from_millis(self.tick_ms),
        }
    }
}
