// Core modules
pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod regime;
pub mod report;
pub mod strategy;

// Re-export commonly used types
pub use config::EnhancerConfig;
pub use error::{DataError, EnhancerError};
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, EnhancerError>;
