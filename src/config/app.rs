//! Main application configuration
//!
//! This module defines the top-level configuration for the club ladder,
//! including environment variable loading, TOML file loading and validation.

use crate::config::rating::RatingConfig;
use crate::config::workflow::{MembershipConfig, WorkflowConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub workflow: WorkflowConfig,
    pub membership: MembershipConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "club-ladder".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(rating) = env::var("DEFAULT_RATING") {
            self.rating.default_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_RATING value: {}", rating))?;
        }

        // Workflow settings
        if let Ok(days) = env::var("RESOLVED_RETENTION_DAYS") {
            self.workflow.resolved_retention_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid RESOLVED_RETENTION_DAYS value: {}", days))?;
        }
        if let Ok(days) = env::var("UNCONFIRMED_EXPIRY_DAYS") {
            self.workflow.unconfirmed_expiry_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid UNCONFIRMED_EXPIRY_DAYS value: {}", days))?;
        }
        if let Ok(days) = env::var("CONFIRMED_EXPIRY_DAYS") {
            self.workflow.confirmed_expiry_days = days
                .parse()
                .map_err(|_| anyhow!("Invalid CONFIRMED_EXPIRY_DAYS value: {}", days))?;
        }
        if let Ok(flag) = env::var("CLEANUP_BEFORE_MUTATION") {
            self.workflow.cleanup_before_mutation = flag
                .parse()
                .map_err(|_| anyhow!("Invalid CLEANUP_BEFORE_MUTATION value: {}", flag))?;
        }

        // Membership settings
        if let Ok(max) = env::var("MAX_ADMINS") {
            self.membership.max_admins = max
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_ADMINS value: {}", max))?;
        }
        if let Ok(max) = env::var("MAX_CLUBS_PER_USER") {
            self.membership.max_clubs_per_user = max
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_CLUBS_PER_USER value: {}", max))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()?;

    // Validate expiry windows
    if config.workflow.resolved_retention_days <= 0 {
        return Err(anyhow!("Resolved retention must be at least one day"));
    }
    if config.workflow.unconfirmed_expiry_days <= 0 {
        return Err(anyhow!("Unconfirmed expiry must be at least one day"));
    }
    if config.workflow.confirmed_expiry_days <= 0 {
        return Err(anyhow!("Confirmed expiry must be at least one day"));
    }

    // Validate membership limits
    if config.membership.max_admins == 0 || config.membership.max_admins > 3 {
        return Err(anyhow!(
            "Max admins must be between 1 and 3, got {}",
            config.membership.max_admins
        ));
    }
    if config.membership.max_clubs_per_user == 0 {
        return Err(anyhow!("Max clubs per user must be greater than 0"));
    }

    Ok(())
}
