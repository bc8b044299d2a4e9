//! Embedded SQLite store implementation.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Priority, Todo, TodoStats, User};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, QueryBuilder, Sqlite};

use crate::error::{db_err, is_unique_violation};
use crate::{NewTodo, NewUser, StoreError, StoreResult, TodoChanges, TodoStore};

/// SQL schema definition. Written so repeated execution is a no-op, which
/// makes startup initialization safe to race.
const SCHEMA_SQL: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Todos table
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium',
    category TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    due_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Indexes for per-user listing
CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
CREATE INDEX IF NOT EXISTS idx_todos_user_created ON todos(user_id, created_at);
"#;

/// File-backed SQLite store for single-process/local use. The database runs
/// in WAL journal mode; SQLite's single-writer model provides the
/// concurrency control.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path` and runs the
    /// idempotent schema bootstrap.
    pub async fn connect(db_path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(db_err("sqlite_connect"))?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err("sqlite_connect"))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Opens an in-memory database on a single connection. Used in tests.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_err("sqlite_connect"))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err("sqlite_connect"))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(db_err("sqlite_schema"))?;
        Ok(())
    }
}

/// Database row for User.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

/// Database row for Todo.
#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    priority: String,
    category: Option<String>,
    completed: bool,
    completed_at: Option<String>,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            priority: Priority::parse(&row.priority).unwrap_or_default(),
            category: row.category,
            completed: row.completed,
            completed_at: row
                .completed_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            due_date: row.due_date,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

const TODO_COLUMNS: &str = "id, user_id, title, description, priority, category, completed, \
                            completed_at, due_date, created_at, updated_at";

#[async_trait]
impl TodoStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(format!(
                    "username already exists: {}",
                    user.username
                )));
            }
            Err(e) => return Err(db_err("create_user")(e)),
        };

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
        })
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get_user_by_username"))?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get_user_by_id"))?;

        Ok(row.map(User::from))
    }

    async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO todos (user_id, title, description, priority, category, completed, \
             completed_at, due_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, NULL, ?, ?, ?)",
        )
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.priority.as_str())
        .bind(&todo.category)
        .bind(&todo.due_date)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err("create_todo"))?;

        Ok(Todo {
            id: result.last_insert_rowid(),
            user_id: todo.user_id,
            title: todo.title,
            description: todo.description,
            priority: todo.priority,
            category: todo.category,
            completed: false,
            completed_at: None,
            due_date: todo.due_date,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<Todo>> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list_todos"))?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn get_todo(&self, id: i64) -> StoreResult<Option<Todo>> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("get_todo"))?;

        Ok(row.map(Todo::from))
    }

    async fn update_todo(&self, id: i64, changes: TodoChanges) -> StoreResult<Todo> {
        if changes.is_empty() {
            return self
                .get_todo(id)
                .await?
                .ok_or(StoreError::NotFound("todo"));
        }

        // The statement is assembled from whichever fields are present;
        // every value goes through push_bind, never string interpolation.
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE todos SET updated_at = ");
        qb.push_bind(Utc::now().to_rfc3339());
        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(priority) = changes.priority {
            qb.push(", priority = ").push_bind(priority.as_str());
        }
        if let Some(category) = changes.category {
            qb.push(", category = ").push_bind(category);
        }
        if let Some(completed) = changes.completed {
            qb.push(", completed = ").push_bind(completed);
        }
        if let Some(completed_at) = changes.completed_at {
            qb.push(", completed_at = ")
                .push_bind(completed_at.map(|ts| ts.to_rfc3339()));
        }
        if let Some(due_date) = changes.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_err("update_todo"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("todo"));
        }

        self.get_todo(id)
            .await?
            .ok_or(StoreError::NotFound("todo"))
    }

    async fn delete_todo(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete_todo"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn completed_stats(&self, user_id: i64) -> StoreResult<TodoStats> {
        let (total, completed): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM todos WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("completed_stats"))?;

        Ok(TodoStats::from_counts(total, completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (SqliteStore, User) {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        (store, user)
    }

    fn new_todo(user_id: i64, title: &str) -> NewTodo {
        NewTodo {
            user_id,
            title: title.to_string(),
            description: None,
            priority: Priority::default(),
            category: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let (store, user) = store_with_user().await;
        assert_eq!(user.id, 1);

        let by_name = store
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.password_hash, "hash");

        let by_id = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(store.get_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected_by_constraint() {
        let (store, _user) = store_with_user().await;
        let err = store
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_todo_defaults() {
        let (store, user) = store_with_user().await;
        let todo = store.create_todo(new_todo(user.id, "Buy milk")).await.unwrap();

        let fetched = store.get_todo(todo.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Buy milk");
        assert!(!fetched.completed);
        assert_eq!(fetched.completed_at, None);
        assert_eq!(fetched.priority, Priority::Medium);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_completion_transition_persists() {
        let (store, user) = store_with_user().await;
        let todo = store.create_todo(new_todo(user.id, "task")).await.unwrap();

        let done_at = Utc::now();
        let updated = store
            .update_todo(
                todo.id,
                TodoChanges {
                    completed: Some(true),
                    completed_at: Some(Some(done_at)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.completed);
        assert!(updated.completed_at.is_some());

        let cleared = store
            .update_todo(
                todo.id,
                TodoChanges {
                    completed: Some(false),
                    completed_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!cleared.completed);
        assert_eq!(cleared.completed_at, None);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let (store, user) = store_with_user().await;
        let todo = store
            .create_todo(NewTodo {
                user_id: user.id,
                title: "task".to_string(),
                description: Some("details".to_string()),
                priority: Priority::High,
                category: Some("home".to_string()),
                due_date: Some("2026-09-01".to_string()),
            })
            .await
            .unwrap();

        let updated = store
            .update_todo(
                todo.id,
                TodoChanges {
                    title: Some("renamed".to_string()),
                    category: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.category, None);
        assert_eq!(updated.description.as_deref(), Some("details"));
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date.as_deref(), Some("2026-09-01"));
        assert_eq!(updated.user_id, user.id);
        assert_eq!(updated.created_at, todo.created_at);
    }

    #[tokio::test]
    async fn test_empty_update_is_noop() {
        let (store, user) = store_with_user().await;
        let todo = store.create_todo(new_todo(user.id, "task")).await.unwrap();

        let updated = store
            .update_todo(todo.id, TodoChanges::default())
            .await
            .unwrap();
        assert_eq!(updated.updated_at, todo.updated_at);
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let (store, user) = store_with_user().await;
        assert!(!store.delete_todo(99).await.unwrap());

        let a = store.create_todo(new_todo(user.id, "a")).await.unwrap();
        store.create_todo(new_todo(user.id, "b")).await.unwrap();
        store.create_todo(new_todo(user.id, "c")).await.unwrap();
        store
            .update_todo(
                a.id,
                TodoChanges {
                    completed: Some(true),
                    completed_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = store.completed_stats(user.id).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 33);

        assert!(store.delete_todo(a.id).await.unwrap());
        let stats = store.completed_stats(user.id).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 0);

        // No todos at all
        let stats = store.completed_stats(999).await.unwrap();
        assert_eq!(stats, TodoStats::from_counts(0, 0));
    }

    #[tokio::test]
    async fn test_list_order() {
        let (store, user) = store_with_user().await;
        let first = store.create_todo(new_todo(user.id, "first")).await.unwrap();
        let second = store.create_todo(new_todo(user.id, "second")).await.unwrap();

        let todos = store.list_todos(user.id).await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].id, second.id);
        assert_eq!(todos[1].id, first.id);

        assert!(store.list_todos(999).await.unwrap().is_empty());
    }
}
