//! Shared types, errors, configuration and retry policy for Paycore.
//!
//! This crate provides common building blocks used by all other crates:
//! - Money types with exact decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Boundary error types
//! - Configuration management and tracing setup
//! - Bounded retry with exponential backoff for read paths

pub mod config;
pub mod error;
pub mod retry;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use retry::{RetryError, RetryPolicy, Retryable, retry};
