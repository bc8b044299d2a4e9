//! Todo entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// High priority.
    High,
    /// Medium priority.
    #[default]
    Medium,
    /// Low priority.
    Low,
}

impl Priority {
    /// Returns the storage representation of this priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parses a priority from its storage representation.
    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// A single to-do item owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, assigned by the store.
    pub id: i64,
    /// Owning user. Immutable after creation.
    pub user_id: i64,
    /// Short title. Required, non-empty.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Priority level.
    pub priority: Priority,
    /// Optional category used for client-side filtering.
    pub category: Option<String>,
    /// Whether the todo is completed.
    pub completed: bool,
    /// Set when `completed` transitions to true, cleared on the transition
    /// back to false. Never recomputed from `completed` on read.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optional due date, stored as an opaque string.
    pub due_date: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate completion statistics for one user's todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    /// Total number of todos.
    pub total: i64,
    /// Number of completed todos.
    pub completed: i64,
    /// Rounded percentage of completed todos, 0 when there are none.
    pub completion_rate: i64,
}

impl TodoStats {
    /// Computes stats from raw counts, guarding the empty case.
    pub fn from_counts(total: i64, completed: i64) -> Self {
        let completion_rate = if total == 0 {
            0
        } else {
            (100.0 * completed as f64 / total as f64).round() as i64
        };
        Self {
            total,
            completed,
            completion_rate,
        }
    }
}
