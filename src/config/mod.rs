//! Configuration management for the club ladder
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the rating engine and the
//! pending-match workflow.

pub mod app;
pub mod rating;
pub mod workflow;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use rating::RatingConfig;
pub use workflow::{MembershipConfig, WorkflowConfig};
