//! TOML configuration file loading and argument resolution
//!
//! Values from the configuration file only fill options that were not given on the
//! command line. The merged `Args` then resolve into a `ScanConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use strum_macros::{Display, EnumString};

use super::args::Args;
use crate::camera::{CaptureConstraints, FacingMode, Resolution};
use crate::core::logging::LogFormat;
use crate::core::validation::{
    parse_symbology_list, validate_positive_int, validate_timeout_ms, validate_zoom,
    ValidationError,
};
use crate::decoder::Symbology;
use crate::lookup::DEFAULT_COSMOS_URL;
use crate::session::{ScanMode, SessionOptions, SimulationOptions};

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Product lookup used when drafting the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LookupProvider {
    #[default]
    None,
    Simulated,
    Cosmos,
}

/// Everything the binary needs to run one scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub options: SessionOptions,
    pub constraints: CaptureConstraints,
    /// Empty means every symbology
    pub symbologies: Vec<Symbology>,
    pub lookup: LookupProvider,
    pub cosmos_url: String,
    pub cosmos_token: Option<String>,
    pub frames: Vec<Vec<u8>>,
    pub frame_interval: Duration,
    pub image: Option<PathBuf>,
    pub json: bool,
}

/// `<config_dir>/Listscan/listscan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Listscan").join("listscan.toml"))
}

impl Args {
    /// Load the configuration file and merge it into these arguments
    ///
    /// An explicitly named file must exist; the default file is optional. Returns the
    /// path that was loaded, if any.
    pub async fn merge_config_file(&mut self) -> Result<Option<PathBuf>, ValidationError> {
        let path = match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ValidationError::new(&format!(
                        "The specified configuration file does not exist: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ValidationError::new(&format!(
                "Error reading configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = toml::from_str::<toml::Table>(&contents).map_err(|e| {
            ValidationError::new(&format!(
                "Error parsing configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.apply_toml_values(&config).map_err(|e| {
            ValidationError::new(&format!("{}: {}", path.display(), e.message()))
        })?;

        log::debug!("Configuration loaded from {}", path.display());
        Ok(Some(path))
    }

    /// Fill unset options from a parsed configuration table
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ValidationError> {
        fill_string(config, "mode", &mut self.mode)?;
        fill_with(config, "timeout-ms", &mut self.timeout_ms, validate_timeout_ms)?;
        fill_with(config, "zoom", &mut self.zoom, validate_zoom)?;
        fill_string(config, "facing", &mut self.facing)?;
        fill_with(config, "width", &mut self.width, validate_positive_int)?;
        fill_with(config, "height", &mut self.height, validate_positive_int)?;
        fill_with(
            config,
            "simulate-delay-ms",
            &mut self.simulate_delay_ms,
            validate_positive_int,
        )?;
        fill_string(config, "simulate-symbology", &mut self.simulate_symbology)?;
        fill_with(config, "seed", &mut self.seed, |raw| {
            raw.parse::<u64>()
                .map_err(|_| format!("'{}' is not a valid seed", raw))
        })?;
        fill_string(config, "lookup", &mut self.lookup)?;
        fill_string(config, "cosmos-url", &mut self.cosmos_url)?;
        fill_string(config, "cosmos-token", &mut self.cosmos_token)?;
        fill_string(config, "log-level", &mut self.log_level)?;
        fill_string(config, "log-format", &mut self.log_format)?;

        if self.symbologies.is_empty() {
            self.symbologies = string_list(config, "symbologies")?;
        }
        if self.log_file.is_none() {
            if let Some(log_file) = config.get("log-file").and_then(|v| v.as_str()) {
                if !(log_file.eq_ignore_ascii_case("none") || log_file == "-") {
                    self.log_file = Some(PathBuf::from(log_file));
                }
            }
        }
        if let Some(color) = config.get("color") {
            let color = color
                .as_bool()
                .ok_or_else(|| ValidationError::new("'color' must be true or false"))?;
            self.set_config_color(color);
        }
        Ok(())
    }

    /// Log file path, with the magic values "none" and "-" disabling file logging
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file
            .as_deref()
            .filter(|path| !(*path == Path::new("none") || *path == Path::new("-")))
    }

    pub fn log_format_choice(&self) -> Result<LogFormat, ValidationError> {
        match &self.log_format {
            None => Ok(LogFormat::default()),
            Some(name) => name
                .parse::<LogFormat>()
                .map_err(|_| ValidationError::new(&format!("Unknown log format '{}'", name))),
        }
    }

    /// Resolve merged arguments into the scan configuration
    pub async fn resolve(&self) -> Result<ScanConfig, ValidationError> {
        let mode = match &self.mode {
            Some(name) => parse_named::<ScanMode>("mode", name)?,
            None => ScanMode::default(),
        };
        let facing = match &self.facing {
            Some(name) => parse_named::<FacingMode>("facing", name)?,
            None => FacingMode::default(),
        };
        let defaults = Resolution::default();
        let resolution = Resolution {
            width: dimension("width", self.width, defaults.width)?,
            height: dimension("height", self.height, defaults.height)?,
        };

        let mut simulation = SimulationOptions {
            seed: self.seed,
            ..SimulationOptions::default()
        };
        if let Some(ms) = self.simulate_delay_ms {
            simulation.delay = Duration::from_millis(ms);
        }
        if let Some(name) = &self.simulate_symbology {
            simulation.symbology = parse_named::<Symbology>("simulate-symbology", name)?;
        }

        let options = SessionOptions {
            zoom_level: self.zoom,
            timeout: self.timeout_ms.map(Duration::from_millis),
            simulation,
        };
        let constraints = CaptureConstraints {
            facing,
            resolution,
            zoom: self.zoom.unwrap_or(1.0),
        };

        let lookup = match &self.lookup {
            Some(name) => parse_named::<LookupProvider>("lookup", name)?,
            None => LookupProvider::default(),
        };
        if lookup == LookupProvider::Cosmos
            && self.cosmos_token.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(ValidationError::new(
                "The cosmos lookup needs a token (--cosmos-token or cosmos-token)",
            ));
        }

        if mode == ScanMode::StillImage && self.image.is_none() {
            return Err(ValidationError::new("Still-image mode needs --image <FILE>"));
        }

        Ok(ScanConfig {
            mode,
            options,
            constraints,
            symbologies: parse_symbology_list(&self.symbologies)?,
            lookup,
            cosmos_url: self
                .cosmos_url
                .clone()
                .unwrap_or_else(|| DEFAULT_COSMOS_URL.to_string()),
            cosmos_token: self.cosmos_token.clone(),
            frames: self.frame_payloads().await?,
            frame_interval: self
                .frame_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_FRAME_INTERVAL),
            image: self.image.clone(),
            json: self.json,
        })
    }

    /// Frames from --frame followed by the lines of --frames-file
    async fn frame_payloads(&self) -> Result<Vec<Vec<u8>>, ValidationError> {
        let mut frames: Vec<Vec<u8>> = self.frames.iter().map(|f| f.as_bytes().to_vec()).collect();
        if let Some(path) = &self.frames_file {
            let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
                ValidationError::new(&format!(
                    "Error reading frames file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            frames.extend(contents.lines().map(|line| line.as_bytes().to_vec()));
        }
        Ok(frames)
    }
}

fn parse_named<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ValidationError> {
    value
        .parse::<T>()
        .map_err(|_| ValidationError::new(&format!("Invalid {} '{}'", key, value)))
}

fn dimension(key: &str, value: Option<u64>, default: u32) -> Result<u32, ValidationError> {
    match value {
        None => Ok(default),
        Some(pixels) => u32::try_from(pixels)
            .map_err(|_| ValidationError::new(&format!("{} {} is too large", key, pixels))),
    }
}

/// Read `key` as text: strings as-is, numbers and booleans in TOML notation
fn raw_value(config: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
        Some(toml::Value::Float(f)) => Ok(Some(f.to_string())),
        Some(other) => Err(ValidationError::new(&format!(
            "'{}' has an unsupported value: {}",
            key, other
        ))),
    }
}

fn fill_string(
    config: &toml::Table,
    key: &str,
    target: &mut Option<String>,
) -> Result<(), ValidationError> {
    if target.is_none() {
        *target = raw_value(config, key)?;
    }
    Ok(())
}

fn fill_with<T>(
    config: &toml::Table,
    key: &str,
    target: &mut Option<T>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<(), ValidationError> {
    if target.is_some() {
        return Ok(());
    }
    if let Some(raw) = raw_value(config, key)? {
        let value = parse(&raw).map_err(|e| ValidationError::new(&format!("'{}': {}", key, e)))?;
        *target = Some(value);
    }
    Ok(())
}

/// A string or an array of strings
fn string_list(config: &toml::Table, key: &str) -> Result<Vec<String>, ValidationError> {
    match config.get(key) {
        None => Ok(Vec::new()),
        Some(toml::Value::String(s)) => Ok(vec![s.clone()]),
        Some(toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::new(&format!("'{}' entries must be strings", key))
                })
            })
            .collect(),
        Some(_) => Err(ValidationError::new(&format!(
            "'{}' must be a string or an array of strings",
            key
        ))),
    }
}
