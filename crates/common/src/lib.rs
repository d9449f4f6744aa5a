//! SalesPulse Common Library
//!
//! Shared code for the SalesPulse services including:
//! - Database entities and repository pattern
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of rows returned by the top-products query
pub const DEFAULT_TOP_PRODUCTS_LIMIT: u64 = 10;
