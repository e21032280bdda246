//! User directory and workflow notifications
//!
//! Notifications are plain dated messages appended to a user's queue. How
//! they reach the user is somebody else's concern.

use crate::types::{Club, MatchRecord, Message, User, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Read access to users plus their message queues
pub trait UserDirectory: Send + Sync {
    /// Look up a user
    fn get_user(&self, user_id: &str) -> Option<&User>;

    /// Append a message to a user's queue; false if the user is unknown
    fn push_message(&mut self, user_id: &str, message: Message) -> bool;

    fn is_system_admin(&self, user_id: &str) -> bool {
        self.get_user(user_id)
            .map(|user| user.is_system_admin)
            .unwrap_or(false)
    }
}

/// In-memory user directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryUserDirectory {
    users: HashMap<UserId, User>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
        }
    }

    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Messages queued for a user, oldest first
    pub fn messages(&self, user_id: &str) -> &[Message] {
        self.users
            .get(user_id)
            .map(|user| user.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    fn push_message(&mut self, user_id: &str, message: Message) -> bool {
        match self.users.get_mut(user_id) {
            Some(user) => {
                user.messages.push(message);
                true
            }
            None => false,
        }
    }
}

/// Workflow events that produce a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    /// A doubles result was submitted and staff should keep an eye on it
    DoublesSubmitted,
    /// Both sides confirmed; staff should approve or veto
    AwaitingApproval,
    Rejected { by: &'a str },
    Vetoed { by: &'a str },
    Approved,
    Recorded { by: &'a str },
}

/// Message text for a notice about `record` in `club`
pub fn notice_text(club: &Club, record: &MatchRecord, notice: Notice<'_>) -> String {
    let summary = record.describe();
    match notice {
        Notice::DoublesSubmitted => {
            format!("[{}] New result submitted: {}", club.name, summary)
        }
        Notice::AwaitingApproval => format!(
            "[{}] Result confirmed by both sides and awaiting approval: {}",
            club.name, summary
        ),
        Notice::Rejected { by } => {
            format!("[{}] Your result was rejected by {}: {}", club.name, by, summary)
        }
        Notice::Vetoed { by } => {
            format!("[{}] Your result was vetoed by {}: {}", club.name, by, summary)
        }
        Notice::Approved => format!(
            "[{}] Result approved and ratings updated: {}",
            club.name, summary
        ),
        Notice::Recorded { by } => format!(
            "[{}] Result recorded by {} and ratings updated: {}",
            club.name, by, summary
        ),
    }
}

/// Send one message to every recipient, returning how many were delivered
pub fn deliver<'a>(
    users: &mut dyn UserDirectory,
    recipients: impl IntoIterator<Item = &'a UserId>,
    date: NaiveDate,
    text: &str,
) -> usize {
    let mut delivered = 0;
    for recipient in recipients {
        let message = Message {
            date,
            text: text.to_string(),
        };
        if users.push_message(recipient, message) {
            delivered += 1;
        } else {
            debug!("Skipping notification for unknown user {}", recipient);
        }
    }
    delivered
}
