//! Offline product lookup
//!
//! Derives a plausible product from the digits of the code after a network-like
//! delay. The category comes from the first two digits; Brazilian (`789`) codes get
//! a brand and product name picked by digits 3-4 and 5-6.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{LookupError, LookupResult};
use super::traits::ProductLookup;
use super::types::{Category, ProductInfo};
use crate::core::sync::handle_mutex_poison;

pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_millis(1500);

const CATEGORIES: [Category; 6] = [
    Category::Food,
    Category::Beverages,
    Category::Cleaning,
    Category::Hygiene,
    Category::Frozen,
    Category::Other,
];

const BRANDS: [&str; 7] = [
    "Qualitá",
    "Taeq",
    "Carrefour",
    "Dia",
    "Nestlé",
    "Ypê",
    "Pão de Açúcar",
];

const PRODUCTS: [&str; 10] = [
    "Whole Grain Rice",
    "Pinto Beans",
    "Ground Roasted Coffee",
    "Crystal Sugar",
    "Cream Cracker Biscuits",
    "Whole Milk",
    "Soybean Oil",
    "Tomato Sauce",
    "Liquid Detergent",
    "Bar Soap",
];

pub struct SimulatedLookup {
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl Default for SimulatedLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_DELAY, None)
    }
}

impl SimulatedLookup {
    /// A `seed` makes prices reproducible
    pub fn new(delay: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            delay,
            rng: Mutex::new(rng),
        }
    }

    fn random_price(&self) -> LookupResult<f64> {
        let mut rng = handle_mutex_poison(self.rng.lock(), |reason| LookupError::Internal {
            reason,
        })?;
        let raw: f64 = rng.gen_range(5.0..30.0);
        Ok(((raw * 100.0).round() / 100.0).min(29.99))
    }
}

fn digits_at(code: &str, range: std::ops::Range<usize>) -> Option<usize> {
    code.get(range)?.parse().ok()
}

/// Category and name for `code`, without the price
pub fn describe_code(code: &str) -> (Category, String) {
    let category = digits_at(code, 0..2)
        .map(|n| CATEGORIES[n % CATEGORIES.len()])
        .unwrap_or(Category::Other);

    let name = if code.starts_with("789") {
        let brand = BRANDS[digits_at(code, 3..5).unwrap_or(0) % BRANDS.len()];
        let product = PRODUCTS[digits_at(code, 5..7).unwrap_or(0) % PRODUCTS.len()];
        format!("{} {}", brand, product)
    } else {
        let prefix: String = code.chars().take(6).collect();
        format!("Product {}", prefix)
    };

    (category, name)
}

#[async_trait]
impl ProductLookup for SimulatedLookup {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn lookup(&self, code: &str) -> LookupResult<Option<ProductInfo>> {
        tokio::time::sleep(self.delay).await;

        let (category, name) = describe_code(code);
        let price = self.random_price()?;
        log::debug!("Simulated lookup {} -> '{}' ({})", code, name, category);

        Ok(Some(ProductInfo {
            name,
            category,
            price: Some(price),
            image_url: None,
        }))
    }
}
