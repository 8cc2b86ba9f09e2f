pub mod drafting;
pub mod global_events;
