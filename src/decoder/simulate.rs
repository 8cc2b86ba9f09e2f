//! Synthetic codes for simulated scans

use rand::Rng;

use super::types::{expand_upc_e, gtin_check_digit, Symbology};

const ALPHANUMERIC: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE39_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";
const VARIABLE_LENGTH: usize = 12;

/// A well-formed code of `symbology`; numeric codes carry a valid check digit
pub fn synthesize_code<R: Rng + ?Sized>(symbology: Symbology, rng: &mut R) -> String {
    match symbology {
        Symbology::UpcE => {
            let body = format!("0{}", random_from(rng, b"0123456789", 6));
            let check = expand_upc_e(&format!("{}0", body))
                .and_then(|upc_a| gtin_check_digit(&upc_a[..11]))
                .unwrap_or(0);
            format!("{}{}", body, check)
        }
        Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA => {
            let length = symbology.fixed_length().unwrap_or(13);
            let body = random_from(rng, b"0123456789", length - 1);
            let check = gtin_check_digit(&body).unwrap_or(0);
            format!("{}{}", body, check)
        }
        Symbology::Code39 => random_from(rng, CODE39_CHARS, VARIABLE_LENGTH),
        Symbology::Code128 | Symbology::Code93 => random_from(rng, ALPHANUMERIC, VARIABLE_LENGTH),
    }
}

fn random_from<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], length: usize) -> String {
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
