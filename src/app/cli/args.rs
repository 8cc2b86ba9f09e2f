//! Command-line arguments
//!
//! Every option is optional so that values missing on the command line can be
//! filled from the configuration file before the arguments are resolved.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::core::validation::{validate_positive_int, validate_timeout_ms, validate_zoom};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "listscan")]
#[command(about = "Scan a product barcode and draft a shopping-list item")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Scan mode
    #[arg(short = 'm', long = "mode", value_name = "MODE", value_parser = ["live", "live-stream", "still", "still-image", "simulated", "simulate"])]
    pub mode: Option<String>,

    /// Give up when no code is recognised within this many milliseconds
    #[arg(short = 't', long = "timeout-ms", value_name = "MS", value_parser = validate_timeout_ms)]
    pub timeout_ms: Option<u64>,

    /// Initial zoom factor for live scans (1.0-5.0)
    #[arg(short = 'z', long = "zoom", value_name = "FACTOR", value_parser = validate_zoom)]
    pub zoom: Option<f64>,

    /// Preferred camera
    #[arg(long = "facing", value_name = "FACING", value_parser = ["environment", "user"])]
    pub facing: Option<String>,

    /// Capture width in pixels
    #[arg(long = "width", value_name = "PIXELS", value_parser = validate_positive_int)]
    pub width: Option<u64>,

    /// Capture height in pixels
    #[arg(long = "height", value_name = "PIXELS", value_parser = validate_positive_int)]
    pub height: Option<u64>,

    /// Symbologies to accept*
    #[arg(short = 's', long = "symbology", value_name = "NAMES", action = ArgAction::Append)]
    pub symbologies: Vec<String>,

    /// Delay before a simulated scan produces its code
    #[arg(long = "simulate-delay-ms", value_name = "MS", value_parser = validate_positive_int)]
    pub simulate_delay_ms: Option<u64>,

    /// Symbology of simulated codes
    #[arg(long = "simulate-symbology", value_name = "NAME")]
    pub simulate_symbology: Option<String>,

    /// Seed for reproducible simulated codes and prices
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Product lookup provider used to draft the item
    #[arg(long = "lookup", value_name = "PROVIDER", value_parser = ["none", "simulated", "cosmos"])]
    pub lookup: Option<String>,

    /// Cosmos API base URL
    #[arg(long = "cosmos-url", value_name = "URL")]
    pub cosmos_url: Option<String>,

    /// Cosmos API token
    #[arg(long = "cosmos-token", value_name = "TOKEN")]
    pub cosmos_token: Option<String>,

    /// Frame payload for the fake camera, in order*
    #[arg(long = "frame", value_name = "PAYLOAD", action = ArgAction::Append)]
    pub frames: Vec<String>,

    /// File with one fake camera frame payload per line
    #[arg(long = "frames-file", value_name = "FILE")]
    pub frames_file: Option<PathBuf>,

    /// Interval between fake camera frames
    #[arg(long = "frame-interval-ms", value_name = "MS", value_parser = validate_positive_int)]
    pub frame_interval_ms: Option<u64>,

    /// Image file to decode in still mode
    #[arg(short = 'i', long = "image", value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output
    #[arg(short = 'g', long = "color", overrides_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", overrides_with = "color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    #[arg(skip)]
    config_color: Option<bool>,
}

impl Args {
    /// `Some(true)` for --color, `Some(false)` for --no-color, otherwise the config
    /// file setting; `None` means decide from the terminal
    pub fn color_choice(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            self.config_color
        }
    }

    pub(crate) fn set_config_color(&mut self, color: bool) {
        self.config_color = Some(color);
    }
}
