use serde_json::Value;
use taskdeck_core::{TaskFields, TaskRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Backlog,
    Active,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "backlog" => Some(TaskStatus::Backlog),
            "active" => Some(TaskStatus::Active),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// A task as the board sees it. The identifier is either the durable id
/// assigned by the remote store or a `local-` placeholder awaiting
/// confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub is_complete: bool,
    pub archived_at: Option<String>,
    pub activated_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub due_date: Option<String>,
    pub categories: Vec<String>,
}

impl Task {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Input for a brand-new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub categories: Vec<String>,
}

/// Shallow-merge patch. Plain `Option` for fields that cannot be null;
/// double `Option` where `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub is_complete: Option<bool>,
    pub archived_at: Option<Option<String>>,
    pub activated_at: Option<Option<String>>,
    pub completed_at: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    pub categories: Option<Vec<String>>,
}

impl TaskPatch {
    /// Applies every present field onto `task`. Used both for the
    /// optimistic merge and for re-asserting the patched fields over a
    /// possibly stale server response.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(is_complete) = self.is_complete {
            task.is_complete = is_complete;
        }
        if let Some(archived_at) = &self.archived_at {
            task.archived_at = archived_at.clone();
        }
        if let Some(activated_at) = &self.activated_at {
            task.activated_at = activated_at.clone();
        }
        if let Some(completed_at) = &self.completed_at {
            task.completed_at = completed_at.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date.clone();
        }
        if let Some(categories) = &self.categories {
            task.categories = categories.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// Maps a wire row to a task. Every attribute gets a defined default when
/// the column is absent; an unrecognized priority falls back to medium.
pub fn task_from_row(row: &TaskRow) -> Task {
    Task {
        id: row.id.clone(),
        title: row.title.clone().unwrap_or_default(),
        description: row.description.clone().unwrap_or_default(),
        status: row
            .status
            .as_deref()
            .and_then(TaskStatus::parse)
            .unwrap_or_default(),
        priority: row
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or_default(),
        is_complete: row.is_complete.unwrap_or(false),
        archived_at: row.archived_at.clone(),
        activated_at: row.activated_at.clone(),
        completed_at: row.completed_at.clone(),
        created_at: row.created_at.clone(),
        updated_at: row.updated_at.clone(),
        due_date: row.due_date.clone(),
        categories: row
            .categories
            .as_deref()
            .map(coerce_categories)
            .unwrap_or_default(),
    }
}

// The categories column is jsonb; coerce stray non-string entries.
fn coerce_categories(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Builds the optimistic task shown while a create is in flight.
pub fn task_from_draft(id: &str, draft: &TaskDraft, created_at: String) -> Task {
    Task {
        id: id.to_string(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        status: draft.status,
        priority: draft.priority,
        is_complete: draft.status == TaskStatus::Completed,
        archived_at: None,
        activated_at: None,
        completed_at: None,
        created_at: Some(created_at),
        updated_at: None,
        due_date: draft.due_date.clone(),
        categories: draft.categories.clone(),
    }
}

/// Insert payload for a draft. Derived timestamps are server-owned and
/// never sent; the categories column is gated by the capability flag.
pub fn draft_to_fields(draft: &TaskDraft, scope: &str, include_categories: bool) -> TaskFields {
    TaskFields {
        user_id: Some(scope.to_string()),
        title: Some(draft.title.clone()),
        description: Some(draft.description.clone()),
        status: Some(draft.status.as_str().to_string()),
        priority: Some(draft.priority.as_str().to_string()),
        is_complete: Some(draft.status == TaskStatus::Completed),
        // outer None omits the column; a draft without a due date must
        // not write an explicit null
        due_date: draft.due_date.clone().map(Some),
        categories: include_categories.then(|| draft.categories.clone()),
        ..TaskFields::default()
    }
}

/// Patch asserting every field the full-value retry payload carries, so
/// the response can be absorbed with the same stale-read precedence as a
/// partial update.
pub fn full_patch(task: &Task) -> TaskPatch {
    TaskPatch {
        title: Some(task.title.clone()),
        description: Some(task.description.clone()),
        status: Some(task.status),
        priority: Some(task.priority),
        is_complete: Some(task.is_complete),
        archived_at: Some(task.archived_at.clone()),
        activated_at: Some(task.activated_at.clone()),
        completed_at: Some(task.completed_at.clone()),
        due_date: Some(task.due_date.clone()),
        categories: Some(task.categories.clone()),
    }
}

/// Update payload carrying only the patched fields, never the full merged
/// task, so fields changed server-side in the meantime are not clobbered.
pub fn patch_to_fields(patch: &TaskPatch, include_categories: bool) -> TaskFields {
    TaskFields {
        user_id: None,
        title: patch.title.clone(),
        description: patch.description.clone(),
        status: patch.status.map(|status| status.as_str().to_string()),
        priority: patch.priority.map(|priority| priority.as_str().to_string()),
        is_complete: patch.is_complete,
        archived_at: patch.archived_at.clone(),
        activated_at: patch.activated_at.clone(),
        completed_at: patch.completed_at.clone(),
        due_date: patch.due_date.clone(),
        categories: if include_categories {
            patch.categories.clone()
        } else {
            None
        },
    }
}

/// Full-value payload for the durable-id retry path: the entity's current
/// local fields are the state the user last saw and intends.
pub fn task_to_fields(task: &Task, scope: Option<&str>, include_categories: bool) -> TaskFields {
    TaskFields {
        user_id: scope.map(str::to_string),
        title: Some(task.title.clone()),
        description: Some(task.description.clone()),
        status: Some(task.status.as_str().to_string()),
        priority: Some(task.priority.as_str().to_string()),
        is_complete: Some(task.is_complete),
        archived_at: Some(task.archived_at.clone()),
        activated_at: Some(task.activated_at.clone()),
        completed_at: Some(task.completed_at.clone()),
        due_date: Some(task.due_date.clone()),
        categories: include_categories.then(|| task.categories.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bare_row(id: &str) -> TaskRow {
        TaskRow {
            id: id.to_string(),
            title: None,
            description: None,
            status: None,
            priority: None,
            is_complete: None,
            archived_at: None,
            activated_at: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
            due_date: None,
            categories: None,
        }
    }

    #[test]
    fn missing_columns_get_defined_defaults() {
        let task = task_from_row(&bare_row("t-1"));

        assert_eq!(task.id, "t-1");
        assert_eq!(task.title, "");
        assert_eq!(task.status, TaskStatus::Backlog);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.is_complete);
        assert!(task.categories.is_empty());
    }

    #[test]
    fn unrecognized_priority_falls_back_to_medium() {
        let mut row = bare_row("t-1");
        row.priority = Some("urgent".into());

        assert_eq!(task_from_row(&row).priority, Priority::Medium);
    }

    #[test]
    fn non_string_category_entries_are_coerced() {
        let mut row = bare_row("t-1");
        row.categories = Some(vec![json!("c-1"), json!(7), json!(true)]);

        assert_eq!(task_from_row(&row).categories, vec!["c-1", "7", "true"]);
    }

    #[test]
    fn mapping_is_referentially_transparent() {
        let mut row = bare_row("t-1");
        row.title = Some("Buy milk".into());
        row.categories = Some(vec![json!("c-1")]);

        assert_eq!(task_from_row(&row), task_from_row(&row));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut task = task_from_row(&bare_row("t-1"));
        task.title = "old".into();
        task.archived_at = Some("2024-05-01T00:00:00Z".into());

        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            archived_at: Some(None),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);

        assert_eq!(task.title, "old");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.archived_at, None);
    }

    #[test]
    fn patch_payload_carries_only_patched_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            is_complete: Some(true),
            ..TaskPatch::default()
        };
        let fields = patch_to_fields(&patch, true);
        let value = serde_json::to_value(&fields).unwrap();

        assert_eq!(
            value,
            json!({ "status": "completed", "is_complete": true })
        );
    }

    #[test]
    fn explicit_null_survives_serialization() {
        let patch = TaskPatch {
            archived_at: Some(None),
            ..TaskPatch::default()
        };
        let value = serde_json::to_value(patch_to_fields(&patch, true)).unwrap();

        assert_eq!(value, json!({ "archived_at": null }));
    }

    #[test]
    fn draft_payload_omits_categories_when_gated() {
        let draft = TaskDraft {
            title: "Buy milk".into(),
            categories: vec!["c-1".into()],
            ..TaskDraft::default()
        };

        let with = serde_json::to_value(draft_to_fields(&draft, "user-1", true)).unwrap();
        let without = serde_json::to_value(draft_to_fields(&draft, "user-1", false)).unwrap();

        assert_eq!(with["categories"], json!(["c-1"]));
        assert!(without.get("categories").is_none());
        assert_eq!(without["user_id"], json!("user-1"));
    }

    #[test]
    fn draft_payload_never_carries_derived_timestamps() {
        let draft = TaskDraft {
            title: "Buy milk".into(),
            ..TaskDraft::default()
        };
        let value = serde_json::to_value(draft_to_fields(&draft, "user-1", true)).unwrap();

        assert!(value.get("created_at").is_none());
        assert!(value.get("updated_at").is_none());
    }

    #[test]
    fn absent_due_date_is_omitted_from_the_insert_payload() {
        let draft = TaskDraft {
            title: "Buy milk".into(),
            ..TaskDraft::default()
        };
        let value = serde_json::to_value(draft_to_fields(&draft, "user-1", true)).unwrap();
        assert!(value.get("due_date").is_none());

        let mut dated = draft;
        dated.due_date = Some("2024-05-01".into());
        let value = serde_json::to_value(draft_to_fields(&dated, "user-1", true)).unwrap();
        assert_eq!(value["due_date"], json!("2024-05-01"));
    }

    #[test]
    fn full_patch_reasserts_every_field_over_a_stale_task() {
        let mut current = task_from_row(&bare_row("t-1"));
        current.title = "edited".into();
        current.status = TaskStatus::Completed;
        current.is_complete = true;
        current.categories = vec!["c-1".into()];

        let mut stale = task_from_row(&bare_row("t-1"));
        stale.title = "old".into();
        full_patch(&current).apply_to(&mut stale);

        assert_eq!(stale, current);
    }
}
