//! Ingestion and query logic for per-user sensor readings.

pub mod filter;
pub mod models;
pub mod service;
pub mod validation;

pub use self::service::{ReadingError, ReadingService, ServiceOptions};
