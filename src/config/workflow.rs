//! Pending-match workflow and membership limits

use serde::{Deserialize, Serialize};

/// Expiry windows for pending matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Days a rejected or vetoed entry stays visible before it is purged
    pub resolved_retention_days: i64,
    /// Days an entry may wait for confirmation
    pub unconfirmed_expiry_days: i64,
    /// Days a confirmed entry may wait for staff approval
    pub confirmed_expiry_days: i64,
    /// Run `cleanup_expired` before each mutating operation
    pub cleanup_before_mutation: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            resolved_retention_days: 3,
            unconfirmed_expiry_days: 7,
            confirmed_expiry_days: 7,
            cleanup_before_mutation: true,
        }
    }
}

/// Limits enforced by the membership guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipConfig {
    pub max_admins: usize,
    pub max_clubs_per_user: usize,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            max_admins: 3,
            max_clubs_per_user: 5,
        }
    }
}
