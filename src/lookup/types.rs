//! Product metadata returned by lookups

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Shopping-list item categories
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[default]
    Food,
    Cleaning,
    Hygiene,
    Beverages,
    Frozen,
    Other,
}

impl Category {
    /// Map a Cosmos provider category name onto ours
    pub fn from_provider(name: &str) -> Self {
        match name.trim() {
            "Alimentos" => Category::Food,
            "Bebidas" => Category::Beverages,
            "Limpeza" => Category::Cleaning,
            "Higiene Pessoal" => Category::Hygiene,
            "Congelados" => Category::Frozen,
            _ => Category::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
