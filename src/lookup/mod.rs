//! Product lookup collaborator
//!
//! Given a scanned code, returns product metadata used to pre-fill a new list item.
//! Providers: an offline simulation, the Cosmos HTTP API, and a caching decorator
//! that wraps either.

pub mod cached;
pub mod cosmos;
pub mod error;
pub mod simulated;
pub mod traits;
pub mod types;

pub use cached::CachedLookup;
pub use cosmos::{CosmosLookup, DEFAULT_COSMOS_URL};
pub use error::{LookupError, LookupResult};
pub use simulated::{SimulatedLookup, DEFAULT_LOOKUP_DELAY};
pub use traits::ProductLookup;
pub use types::{Category, ProductInfo};
