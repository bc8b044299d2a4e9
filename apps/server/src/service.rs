//! Todo authorization and payload sanitization.
//!
//! Every mutating todo request flows through here: ownership is checked
//! against the session user, raw payloads are filtered to the recognized
//! mutable field set, and completion-timestamp bookkeeping is derived from
//! the `completed` transition before anything reaches the store.

use chrono::Utc;
use entities::{Priority, Todo};
use serde::Deserialize;
use serde_json::{Map, Value};
use todo_store::{NewTodo, TodoChanges, TodoStore};

use crate::error::{ApiError, ApiResult};

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Raw creation payload. Unknown keys are dropped by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodoPayload {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
}

/// Loads a todo and checks that it belongs to the session user.
///
/// Absence is reported before ownership, so `Forbidden` is only reachable
/// for a todo that exists. This ordering is deliberate and load-bearing for
/// API compatibility.
pub async fn load_owned_todo<S: TodoStore>(
    store: &S,
    user_id: i64,
    todo_id: i64,
) -> ApiResult<Todo> {
    let todo = store
        .get_todo(todo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("todo not found".to_string()))?;

    if todo.user_id != user_id {
        return Err(ApiError::Forbidden);
    }

    Ok(todo)
}

/// Builds the creation input: title required (non-empty trimmed, at most
/// 500 characters), priority silently coerced to medium when absent or
/// unrecognized, free-text fields trimmed with empty treated as absent,
/// due date passed through untouched. `user_id` always comes from the
/// session, never from the payload.
pub fn sanitize_new_todo(user_id: i64, payload: CreateTodoPayload) -> ApiResult<NewTodo> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::Validation(
            "title must be at most 500 characters".to_string(),
        ));
    }

    let priority = payload
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .unwrap_or_default();

    Ok(NewTodo {
        user_id,
        title: title.to_string(),
        description: trim_to_option(payload.description),
        priority,
        category: trim_to_option(payload.category),
        due_date: payload.due_date,
    })
}

/// Filters a raw update payload down to the recognized mutable fields and
/// derives `completed_at` from the completion transition.
///
/// Unrecognized keys are silently dropped. Within the recognized set,
/// `title` must be a non-empty trimmed string and `priority` a valid enum
/// value; `completed` participates only when it is a boolean.
pub fn sanitize_update(todo: &Todo, payload: &Map<String, Value>) -> ApiResult<TodoChanges> {
    let mut changes = TodoChanges::default();

    if let Some(value) = payload.get("title") {
        let title = value
            .as_str()
            .map(str::trim)
            .ok_or_else(|| ApiError::Validation("title must be a string".to_string()))?;
        if title.is_empty() {
            return Err(ApiError::Validation("title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ApiError::Validation(
                "title must be at most 500 characters".to_string(),
            ));
        }
        changes.title = Some(title.to_string());
    }

    if let Some(value) = payload.get("description") {
        changes.description = Some(trimmed_string_or_null(value, "description")?);
    }

    if let Some(value) = payload.get("priority") {
        let priority = value
            .as_str()
            .and_then(Priority::parse)
            .ok_or_else(|| {
                ApiError::Validation("priority must be one of high, medium, low".to_string())
            })?;
        changes.priority = Some(priority);
    }

    if let Some(value) = payload.get("category") {
        changes.category = Some(trimmed_string_or_null(value, "category")?);
    }

    if let Some(Value::Bool(completed)) = payload.get("completed") {
        changes.completed = Some(*completed);
        if *completed && !todo.completed {
            changes.completed_at = Some(Some(Utc::now()));
        } else if !*completed {
            changes.completed_at = Some(None);
        }
        // Already completed and still true: completed_at stays untouched.
    }

    if let Some(value) = payload.get("due_date") {
        // Opaque passthrough: no trimming, no date parsing.
        changes.due_date = Some(match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            _ => {
                return Err(ApiError::Validation(
                    "due_date must be a string".to_string(),
                ))
            }
        });
    }

    Ok(changes)
}

fn trim_to_option(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trimmed_string_or_null(value: &Value, field: &str) -> ApiResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok(if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            })
        }
        _ => Err(ApiError::Validation(format!("{field} must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use todo_store::{MemoryStore, NewUser};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn todo(user_id: i64, completed: bool) -> Todo {
        let now = Utc::now();
        Todo {
            id: 1,
            user_id,
            title: "task".to_string(),
            description: None,
            priority: Priority::Medium,
            category: None,
            completed,
            completed_at: completed.then(|| now),
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_requires_title() {
        let err = sanitize_new_todo(1, CreateTodoPayload::default()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = sanitize_new_todo(
            1,
            CreateTodoPayload {
                title: "   ".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = sanitize_new_todo(
            1,
            CreateTodoPayload {
                title: "x".repeat(501),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_create_coerces_priority_silently() {
        let new_todo = sanitize_new_todo(
            1,
            CreateTodoPayload {
                title: "task".to_string(),
                priority: Some("urgent".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(new_todo.priority, Priority::Medium);

        let new_todo = sanitize_new_todo(
            1,
            CreateTodoPayload {
                title: "task".to_string(),
                priority: Some("high".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(new_todo.priority, Priority::High);
    }

    #[test]
    fn test_create_trims_and_stamps_owner() {
        let new_todo = sanitize_new_todo(
            7,
            CreateTodoPayload {
                title: "  task  ".to_string(),
                description: Some("   ".to_string()),
                category: Some(" home ".to_string()),
                due_date: Some(" 2026-09-01 ".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(new_todo.user_id, 7);
        assert_eq!(new_todo.title, "task");
        assert_eq!(new_todo.description, None);
        assert_eq!(new_todo.category.as_deref(), Some("home"));
        // Due date is opaque, not trimmed
        assert_eq!(new_todo.due_date.as_deref(), Some(" 2026-09-01 "));
    }

    #[test]
    fn test_update_drops_unknown_keys() {
        let payload = object(json!({
            "id": 999,
            "user_id": 999,
            "created_at": "2020-01-01T00:00:00Z",
            "bogus": true,
            "category": "work"
        }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();

        assert_eq!(changes.category, Some(Some("work".to_string())));
        assert!(changes.title.is_none());
        assert!(changes.completed.is_none());
    }

    #[test]
    fn test_update_empty_payload_is_empty_changes() {
        let payload = object(json!({}));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_update_title_validation() {
        let payload = object(json!({ "title": "  " }));
        assert!(sanitize_update(&todo(1, false), &payload).is_err());

        let payload = object(json!({ "title": 42 }));
        assert!(sanitize_update(&todo(1, false), &payload).is_err());

        let payload = object(json!({ "title": "  renamed  " }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert_eq!(changes.title.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_update_priority_validation() {
        let payload = object(json!({ "priority": "urgent" }));
        assert!(sanitize_update(&todo(1, false), &payload).is_err());

        let payload = object(json!({ "priority": "low" }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert_eq!(changes.priority, Some(Priority::Low));
    }

    #[test]
    fn test_completion_transition_sets_timestamp() {
        let payload = object(json!({ "completed": true }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert_eq!(changes.completed, Some(true));
        assert!(matches!(changes.completed_at, Some(Some(_))));
    }

    #[test]
    fn test_completion_to_false_clears_timestamp() {
        let payload = object(json!({ "completed": false }));
        let changes = sanitize_update(&todo(1, true), &payload).unwrap();
        assert_eq!(changes.completed, Some(false));
        assert_eq!(changes.completed_at, Some(None));
    }

    #[test]
    fn test_completion_true_to_true_leaves_timestamp() {
        let payload = object(json!({ "completed": true }));
        let changes = sanitize_update(&todo(1, true), &payload).unwrap();
        assert_eq!(changes.completed, Some(true));
        assert!(changes.completed_at.is_none());
    }

    #[test]
    fn test_non_boolean_completed_is_dropped() {
        let payload = object(json!({ "completed": "yes" }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert!(changes.completed.is_none());
        assert!(changes.completed_at.is_none());
    }

    #[test]
    fn test_nullable_fields_clear_with_null() {
        let payload = object(json!({
            "description": null,
            "category": null,
            "due_date": null
        }));
        let changes = sanitize_update(&todo(1, false), &payload).unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.category, Some(None));
        assert_eq!(changes.due_date, Some(None));
    }

    #[tokio::test]
    async fn test_load_owned_todo_checks_existence_before_ownership() {
        let store = MemoryStore::new();
        let owner = store
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let other = store
            .create_user(NewUser {
                username: "bob".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let todo = store
            .create_todo(todo_store::NewTodo {
                user_id: owner.id,
                title: "task".to_string(),
                description: None,
                priority: Priority::default(),
                category: None,
                due_date: None,
            })
            .await
            .unwrap();

        // Missing todo is not-found even for a non-owner
        let err = load_owned_todo(&store, other.id, 999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Existing todo owned by someone else is forbidden
        let err = load_owned_todo(&store, other.id, todo.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        // Owner gets the todo back
        let loaded = load_owned_todo(&store, owner.id, todo.id).await.unwrap();
        assert_eq!(loaded.id, todo.id);
    }
}
