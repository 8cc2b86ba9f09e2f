//! Result Sink component
//!
//! Forwards the one decode result of a successful session to the item-creation
//! workflow.

pub mod draft;
pub mod error;
pub mod forwarding;
pub mod traits;

pub use draft::{DraftItemWorkflow, ItemDraft};
pub use error::{SinkError, SinkResult};
pub use forwarding::{ForwardingSink, NullSink};
pub use traits::{ItemWorkflow, ResultSink};
