//! Decoder data types and symbology rules

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Barcode symbologies the adapter recognises
///
/// Parsing accepts the labels engines commonly emit (`ean_13`, `EAN_13`, `ean13`,
/// `code_128`, `upc_e`, ...), case-insensitively. Display uses the canonical name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Symbology {
    #[strum(to_string = "EAN-13", serialize = "ean_13", serialize = "ean13")]
    #[serde(rename = "EAN-13")]
    Ean13,
    #[strum(to_string = "EAN-8", serialize = "ean_8", serialize = "ean8")]
    #[serde(rename = "EAN-8")]
    Ean8,
    #[strum(to_string = "Code128", serialize = "code_128", serialize = "code-128")]
    Code128,
    #[strum(to_string = "Code39", serialize = "code_39", serialize = "code-39")]
    Code39,
    #[strum(to_string = "Code93", serialize = "code_93", serialize = "code-93")]
    Code93,
    #[strum(to_string = "UPC-A", serialize = "upc_a", serialize = "upca", serialize = "upc")]
    #[serde(rename = "UPC-A")]
    UpcA,
    #[strum(to_string = "UPC-E", serialize = "upc_e", serialize = "upce")]
    #[serde(rename = "UPC-E")]
    UpcE,
}

const CODE39_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

impl Symbology {
    /// Digit count for fixed-length symbologies, `None` for variable-length ones
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            Symbology::Ean13 => Some(13),
            Symbology::Ean8 => Some(8),
            Symbology::UpcA => Some(12),
            Symbology::UpcE => Some(8),
            Symbology::Code128 | Symbology::Code39 | Symbology::Code93 => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.fixed_length().is_some()
    }

    /// Character set and length check; says nothing about the check digit
    pub fn is_well_formed(self, code: &str) -> bool {
        if code.is_empty() {
            return false;
        }
        match self {
            Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA => {
                Some(code.len()) == self.fixed_length() && code.bytes().all(|b| b.is_ascii_digit())
            }
            // Number system 0 or 1 only
            Symbology::UpcE => {
                code.len() == 8
                    && code.bytes().all(|b| b.is_ascii_digit())
                    && matches!(code.as_bytes()[0], b'0' | b'1')
            }
            Symbology::Code39 => code.chars().all(|c| CODE39_ALPHABET.contains(c)),
            Symbology::Code128 | Symbology::Code93 => {
                code.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
            }
        }
    }

    /// GTIN mod-10 check; `None` for symbologies without one or malformed codes
    pub fn has_valid_check_digit(self, code: &str) -> Option<bool> {
        if !self.is_numeric() || !self.is_well_formed(code) {
            return None;
        }
        let digits = match self {
            Symbology::UpcE => expand_upc_e(code)?,
            _ => code.to_string(),
        };
        let (body, check) = digits.split_at(digits.len() - 1);
        Some(gtin_check_digit(body)? == check.parse::<u32>().ok()?)
    }
}

/// Mod-10 check digit over the payload digits (weights 3,1,3,... from the right)
pub fn gtin_check_digit(body: &str) -> Option<u32> {
    let mut sum = 0;
    for (position, c) in body.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        sum += if position % 2 == 0 { digit * 3 } else { digit };
    }
    Some((10 - sum % 10) % 10)
}

/// Expand an 8-digit UPC-E code to its 12-digit UPC-A equivalent
pub fn expand_upc_e(code: &str) -> Option<String> {
    let d: Vec<char> = code.chars().collect();
    if d.len() != 8 || !d.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (ns, x, check) = (d[0], &d[1..7], d[7]);
    let body: String = match x[5] {
        '0' | '1' | '2' => [x[0], x[1], x[5], '0', '0', '0', '0', x[2], x[3], x[4]]
            .iter()
            .collect(),
        '3' => [x[0], x[1], x[2], '0', '0', '0', '0', '0', x[3], x[4]]
            .iter()
            .collect(),
        '4' => [x[0], x[1], x[2], x[3], '0', '0', '0', '0', '0', x[4]]
            .iter()
            .collect(),
        _ => [x[0], x[1], x[2], x[3], x[4], '0', '0', '0', '0', x[5]]
            .iter()
            .collect(),
    };
    Some(format!("{}{}{}", ns, body, check))
}

/// Where a decode result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DecodeSource {
    Frame,
    Still,
}

/// A recognised product code; one per successful session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub code: String,
    pub format: Symbology,
    pub source: DecodeSource,
}

/// Engine-specific detection before normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub code: String,
    pub format: String,
}

impl RawDetection {
    pub fn new(format: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            format: format.into(),
        }
    }
}

/// One still image submitted for decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

impl StillImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Outcome of decoding one live frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAttempt {
    Hit(DecodeResult),
    Miss,
    /// The capture stream failed or ended; no further attempts follow
    DeviceLost(String),
}

/// Outcome of a single still decode
#[derive(Debug, Clone, PartialEq)]
pub enum StillOutcome {
    Found(DecodeResult),
    NotFound,
}

/// What a decode backend can do
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderCapabilities {
    pub symbologies: Vec<Symbology>,
    pub live: bool,
    pub still: bool,
}
