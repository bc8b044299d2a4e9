//! Networked PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{Priority, Todo, TodoStats, User};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::{db_err, is_unique_violation};
use crate::{NewTodo, NewUser, StoreError, StoreResult, TodoChanges, TodoStore};

/// SQL schema definition. Written so repeated execution is a no-op, which
/// makes startup initialization safe to race.
const SCHEMA_SQL: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

-- Todos table
CREATE TABLE IF NOT EXISTS todos (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium',
    category TEXT,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    completed_at TIMESTAMPTZ,
    due_date TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

-- Indexes for per-user listing
CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
CREATE INDEX IF NOT EXISTS idx_todos_user_created ON todos(user_id, created_at DESC);
"#;

/// Pooled PostgreSQL store for concurrent/production use. TLS options ride
/// in the connection URL, applied once at process start.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database and runs the idempotent schema bootstrap.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(db_err("postgres_connect"))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(db_err("postgres_schema"))?;
        Ok(())
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
    completed_at: Option<DateTime<Utc>>,
    due_date: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
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
            completed_at: row.completed_at,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for User.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

const TODO_COLUMNS: &str = "id, user_id, title, description, priority, category, completed, \
                            completed_at, due_date, created_at, updated_at";

#[async_trait]
impl TodoStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, created_at) VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        let id = match result {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(format!(
                    "username already exists: {}",
                    user.username
                )));
            }
            Err(e) => return Err(db_err("create_user")(e)),
        };

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
        })
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get_user_by_username"))?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("get_user_by_id"))?;

        Ok(row.map(User::from))
    }

    async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO todos (user_id, title, description, priority, category, completed, \
             completed_at, due_date, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, FALSE, NULL, $6, $7, $8)
             RETURNING id",
        )
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.priority.as_str())
        .bind(&todo.category)
        .bind(&todo.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("create_todo"))?;

        Ok(Todo {
            id,
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
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list_todos"))?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn get_todo(&self, id: i64) -> StoreResult<Option<Todo>> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"))
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
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE todos SET updated_at = ");
        qb.push_bind(Utc::now());
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
            qb.push(", completed_at = ").push_bind(completed_at);
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
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete_todo"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn completed_stats(&self, user_id: i64) -> StoreResult<TodoStats> {
        let (total, completed): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE completed) FROM todos WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("completed_stats"))?;

        Ok(TodoStats::from_counts(total, completed))
    }
}
