use crate::client::{CategoryRow, TaskRow};

/// What a push notification says happened to a row. The stream delivers
/// these eventually and possibly out of order or duplicated; consumers must
/// apply them idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct TaskChange {
    pub kind: ChangeKind,
    /// Row payload for inserts and updates.
    pub new: Option<TaskRow>,
    /// Identifier of the removed row for deletes.
    pub old_id: Option<String>,
}

impl TaskChange {
    pub fn upsert(kind: ChangeKind, row: TaskRow) -> Self {
        Self {
            kind,
            new: Some(row),
            old_id: None,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old_id: Some(id.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryChange {
    pub kind: ChangeKind,
    pub new: Option<CategoryRow>,
    pub old_id: Option<String>,
}

impl CategoryChange {
    pub fn upsert(kind: ChangeKind, row: CategoryRow) -> Self {
        Self {
            kind,
            new: Some(row),
            old_id: None,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old_id: Some(id.into()),
        }
    }
}
