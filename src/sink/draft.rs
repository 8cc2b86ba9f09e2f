//! Item drafts pre-filled from a scanned code
//!
//! The workflow hands each code to a background drafting task that looks it up and
//! sends a draft for the new list item, so a slow lookup never holds up the session
//! that scanned the code. Without a lookup, or when the product is unknown or the
//! lookup fails, the draft falls back to a generic name derived from the code.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use super::error::{SinkError, SinkResult};
use super::traits::ItemWorkflow;
use crate::lookup::{Category, ProductInfo, ProductLookup};

/// Fields of a new list item, ready for the user to confirm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDraft {
    pub barcode: String,
    pub name: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub category: Category,
}

impl ItemDraft {
    /// Draft used when nothing is known about the product
    pub fn fallback(code: &str) -> Self {
        let prefix: String = code.chars().take(4).collect();
        Self {
            barcode: code.to_string(),
            name: format!("Product {}", prefix),
            quantity: 1,
            price: None,
            category: Category::Food,
        }
    }

    pub fn from_product(code: &str, product: ProductInfo) -> Self {
        Self {
            barcode: code.to_string(),
            name: product.name,
            quantity: 1,
            price: product.price,
            category: product.category,
        }
    }
}

pub struct DraftItemWorkflow {
    lookup: Option<Arc<dyn ProductLookup>>,
    drafts: mpsc::UnboundedSender<ItemDraft>,
}

impl DraftItemWorkflow {
    pub fn new(
        lookup: Option<Arc<dyn ProductLookup>>,
    ) -> (Self, mpsc::UnboundedReceiver<ItemDraft>) {
        let (drafts, receiver) = mpsc::unbounded_channel();
        (Self { lookup, drafts }, receiver)
    }
}

async fn draft_for(lookup: Option<Arc<dyn ProductLookup>>, code: &str) -> ItemDraft {
    let lookup = match lookup {
        Some(lookup) => lookup,
        None => return ItemDraft::fallback(code),
    };

    match lookup.lookup(code).await {
        Ok(Some(product)) => ItemDraft::from_product(code, product),
        Ok(None) => {
            log::info!("Product {} not found by {} lookup", code, lookup.name());
            ItemDraft::fallback(code)
        }
        Err(e) => {
            log::warn!("Product lookup for {} failed: {}", code, e);
            ItemDraft::fallback(code)
        }
    }
}

#[async_trait]
impl ItemWorkflow for DraftItemWorkflow {
    /// Start drafting `code` in the background; fails only once the receiver is gone
    async fn on_product_code_scanned(&self, code: &str) -> SinkResult<()> {
        if self.drafts.is_closed() {
            return Err(SinkError::ChannelClosed);
        }

        let lookup = self.lookup.clone();
        let drafts = self.drafts.clone();
        let code = code.to_string();
        tokio::spawn(async move {
            let draft = draft_for(lookup, &code).await;
            log::debug!("Draft for {}: '{}' ({})", code, draft.name, draft.category);
            if drafts.send(draft).is_err() {
                log::debug!("Draft for {} dropped; nobody is waiting for it", code);
            }
        });
        Ok(())
    }
}
