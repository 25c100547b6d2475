//! E-Consultation Common Library
//!
//! Shared code for the e-consultation services including:
//! - Bill and section catalog
//! - Database pool, migrations, and repository
//! - External ML client abstraction
//! - Comment intake and overview generation services
//! - Error types and the JSON response envelope
//! - Configuration management
//! - Metrics and observability

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod guardrails;
pub mod intake;
pub mod metrics;
pub mod ml;
pub mod overview;

// Re-export commonly used types
pub use catalog::{Bill, Section};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{ApiResponse, AppError, Result};
pub use intake::CommentIntake;
pub use ml::MlClient;
pub use overview::OverviewGenerator;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confidence score stored with every comment. The ML service does not
/// report one, so the platform records a fixed value.
pub const DEFAULT_CONFIDENCE_SCORE: f64 = 4.2;

/// Stakeholder type recorded when the submitter does not provide one
pub const DEFAULT_STAKEHOLDER_TYPE: &str = "Individual";
