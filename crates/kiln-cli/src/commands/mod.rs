pub mod platform;
pub mod setup;
pub mod targets;
