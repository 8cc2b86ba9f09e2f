pub mod app;
pub mod camera;
pub mod core;
pub mod decoder;
pub mod lookup;
pub mod notifications;
pub mod session;
pub mod sink;
