//! Validation utilities for CLI arguments and configuration values

use crate::decoder::Symbology;
use crate::session::{MAX_ZOOM, MIN_ZOOM};

/// A rejected argument or configuration value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Zoom factor between 1.0 and 5.0
pub fn validate_zoom(value: &str) -> Result<f64, String> {
    let level = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a valid zoom factor", value))?;
    if (MIN_ZOOM..=MAX_ZOOM).contains(&level) {
        Ok(level)
    } else {
        Err(format!(
            "Zoom {} is outside {:.1}-{:.1}",
            value, MIN_ZOOM, MAX_ZOOM
        ))
    }
}

/// Timeout in milliseconds; zero is rejected
pub fn validate_timeout_ms(value: &str) -> Result<u64, String> {
    validate_positive_int(value).map_err(|e| format!("Invalid timeout: {}", e))
}

/// Comma-separated symbology names, deduplicated in order of first appearance
pub fn parse_symbology_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<Symbology>, String> {
    let mut symbologies = Vec::new();
    for name in values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        let symbology = name
            .parse::<Symbology>()
            .map_err(|_| format!("Unknown symbology '{}'", name))?;
        if !symbologies.contains(&symbology) {
            symbologies.push(symbology);
        }
    }
    Ok(symbologies)
}
