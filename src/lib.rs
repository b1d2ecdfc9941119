pub mod analysis;
pub mod anki;
pub mod audio;
pub mod backends;
pub mod catalog;
pub mod config_loader;
pub mod cortex;
pub mod error;
pub mod generator;
pub mod rate_limiter;
pub mod service;
