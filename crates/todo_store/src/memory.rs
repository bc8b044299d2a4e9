//! In-memory store implementation for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use entities::{Todo, TodoStats, User};

use crate::{NewTodo, NewUser, StoreError, StoreResult, TodoChanges, TodoStore};

/// In-memory implementation backed by hash maps. Used as a test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<i64, User>,
    todos: HashMap<i64, Todo>,
    next_user_id: i64,
    next_todo_id: i64,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().unwrap();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username already exists: {}",
                user.username
            )));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn create_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        let mut inner = self.inner.write().unwrap();
        inner.next_todo_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: inner.next_todo_id,
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
        };
        inner.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<Todo>> {
        let inner = self.inner.read().unwrap();
        let mut result: Vec<Todo> = inner
            .todos
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // Tie-break on id so todos created in the same instant stay ordered.
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    async fn get_todo(&self, id: i64) -> StoreResult<Option<Todo>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.todos.get(&id).cloned())
    }

    async fn update_todo(&self, id: i64, changes: TodoChanges) -> StoreResult<Todo> {
        let mut inner = self.inner.write().unwrap();
        let todo = inner
            .todos
            .get_mut(&id)
            .ok_or(StoreError::NotFound("todo"))?;

        if changes.is_empty() {
            return Ok(todo.clone());
        }

        if let Some(title) = changes.title {
            todo.title = title;
        }
        if let Some(description) = changes.description {
            todo.description = description;
        }
        if let Some(priority) = changes.priority {
            todo.priority = priority;
        }
        if let Some(category) = changes.category {
            todo.category = category;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }
        if let Some(completed_at) = changes.completed_at {
            todo.completed_at = completed_at;
        }
        if let Some(due_date) = changes.due_date {
            todo.due_date = due_date;
        }
        todo.updated_at = Utc::now();

        Ok(todo.clone())
    }

    async fn delete_todo(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.todos.remove(&id).is_some())
    }

    async fn completed_stats(&self, user_id: i64) -> StoreResult<TodoStats> {
        let inner = self.inner.read().unwrap();
        let mut total = 0;
        let mut completed = 0;
        for todo in inner.todos.values().filter(|t| t.user_id == user_id) {
            total += 1;
            if todo.completed {
                completed += 1;
            }
        }
        Ok(TodoStats::from_counts(total, completed))
    }
}
