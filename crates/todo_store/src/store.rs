//! Store trait and input types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Priority, Todo, TodoStats, User};

use crate::StoreResult;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique, case-sensitive username.
    pub username: String,
    /// Opaque password hash.
    pub password_hash: String,
}

/// Input for creating a todo. Everything except `user_id` and `title` is
/// optional; defaults are applied by the store.
#[derive(Debug, Clone)]
pub struct NewTodo {
    /// Owning user.
    pub user_id: i64,
    /// Non-empty title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority, already defaulted by the caller.
    pub priority: Priority,
    /// Optional category.
    pub category: Option<String>,
    /// Optional opaque due date.
    pub due_date: Option<String>,
}

/// A dynamic partial update for a todo.
///
/// Each `Some` field is applied; `None` fields are left untouched. The inner
/// `Option` on nullable columns distinguishes "set to NULL" from "leave as
/// is". Only the mutable field set is representable here: `id`, `user_id`,
/// and `created_at` cannot be expressed.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    /// New title.
    pub title: Option<String>,
    /// New description, or `Some(None)` to clear it.
    pub description: Option<Option<String>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New category, or `Some(None)` to clear it.
    pub category: Option<Option<String>>,
    /// New completed flag.
    pub completed: Option<bool>,
    /// Completion timestamp bookkeeping derived from the `completed`
    /// transition by the caller.
    pub completed_at: Option<Option<DateTime<Utc>>>,
    /// New due date, or `Some(None)` to clear it.
    pub due_date: Option<Option<String>>,
}

impl TodoChanges {
    /// True when no field is set. An empty change set is a no-op update.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.completed.is_none()
            && self.completed_at.is_none()
            && self.due_date.is_none()
    }
}

/// Trait for user and todo storage operations.
///
/// Implementations convert backend failures into [`crate::StoreError`]
/// values and log them; raw backend errors never cross this boundary.
#[async_trait]
pub trait TodoStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user. Fails with `StoreError::Conflict` if the username
    /// is already taken; the uniqueness constraint is authoritative even
    /// when callers pre-check.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Gets a user by ID.
    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    // =========================================================================
    // Todo operations
    // =========================================================================

    /// Creates a new todo with `completed = false` and
    /// `created_at == updated_at`.
    async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo>;

    /// Lists a user's todos, most recently created first. Returns an empty
    /// vec, not an error, when the user has none.
    async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<Todo>>;

    /// Gets a todo by ID.
    async fn get_todo(&self, id: i64) -> StoreResult<Option<Todo>>;

    /// Applies a partial update in a single statement, refreshing
    /// `updated_at`. An empty change set returns the current record
    /// unchanged. Returns the post-update record.
    async fn update_todo(&self, id: i64, changes: TodoChanges) -> StoreResult<Todo>;

    /// Deletes a todo. Returns true iff a row was removed; a missing ID is
    /// false, not an error.
    async fn delete_todo(&self, id: i64) -> StoreResult<bool>;

    /// Returns aggregate completion statistics for a user's todos.
    async fn completed_stats(&self, user_id: i64) -> StoreResult<TodoStats>;
}
