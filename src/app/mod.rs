//! Application module

pub mod cli;
pub mod overlay;
pub mod startup;
