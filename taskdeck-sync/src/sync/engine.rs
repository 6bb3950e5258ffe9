use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use taskdeck_core::{
    BoardClient, BoardError, CategoryChange, CategoryFields, ChangeKind, TaskChange, TaskRow,
};

use super::categories::{Category, CategoryBoard, DEFAULT_CATEGORIES, FALLBACK_COLOR,
    category_from_row};
use super::ledger::SyncStatus;
use super::mapper::{self, Task, TaskDraft, TaskPatch};
use super::replica::BoardStats;
use super::state::BoardState;

const TEMP_ID_PREFIX: &str = "local-";
const CATEGORIES_COLUMN: &str = "categories";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("remote call failed: {0}")]
    Remote(#[from] BoardError),
    #[error("a task title is required")]
    EmptyTitle,
    #[error("a category label is required")]
    EmptyLabel,
}

/// True for locally generated placeholder identifiers that have not been
/// confirmed by the server yet.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

fn temp_task_id() -> String {
    format!("{TEMP_ID_PREFIX}{:032x}", rand::random::<u128>())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// The optimistic synchronization engine. Mutations land in the local
/// replica immediately, the remote call confirms or rejects them, and the
/// push-event stream may interleave at any point between two operations.
///
/// Single-writer: methods take `&mut self` and each externally triggered
/// event runs to completion before the next is handled.
pub struct SyncEngine {
    client: BoardClient,
    state: BoardState,
    categories: CategoryBoard,
    scope: String,
    // Capability learned from the server: whether the tasks table accepts
    // the optional categories column. Flips to false once per session.
    categories_supported: bool,
}

impl SyncEngine {
    pub fn new(client: BoardClient, scope: impl Into<String>) -> Self {
        Self {
            client,
            state: BoardState::default(),
            categories: CategoryBoard::default(),
            scope: scope.into(),
            categories_supported: true,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// A scope change means a different vault owns the data: drop
    /// everything and start from empty. The caller re-subscribes the push
    /// channel and calls `refresh` afterwards.
    pub fn set_scope(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if scope != self.scope {
            self.scope = scope;
            self.state.reset();
            self.categories.clear();
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    pub fn archived_tasks(&self) -> &[Task] {
        self.state.archived_tasks()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.get(id)
    }

    pub fn stats(&self) -> BoardStats {
        self.state.stats()
    }

    pub fn sync_status(&self, id: &str) -> Option<SyncStatus> {
        self.state.status(id)
    }

    pub fn sync_error(&self, id: &str) -> Option<&str> {
        self.state.error_message(id)
    }

    pub fn categories(&self) -> &[Category] {
        self.categories.as_slice()
    }

    /// Full re-fetch from the remote store, replacing the local replica.
    pub async fn refresh(&mut self) -> Result<usize, EngineError> {
        let rows = self.client.list_tasks().await?;
        let tasks: Vec<Task> = rows.iter().map(mapper::task_from_row).collect();
        let count = tasks.len();
        self.state.load(tasks);
        Ok(count)
    }

    /// Creates a task optimistically. On failure the optimistic entity
    /// stays visible under its temporary id so typed input is not lost;
    /// the user retries or discards explicitly.
    pub async fn create_task(&mut self, draft: TaskDraft) -> Result<Task, EngineError> {
        if draft.title.trim().is_empty() {
            return Err(EngineError::EmptyTitle);
        }

        let temp_id = temp_task_id();
        let optimistic = mapper::task_from_draft(&temp_id, &draft, now_rfc3339());
        self.state.stage(optimistic);

        match self.insert_with_degrade(&draft).await {
            Ok(row) => {
                let task = mapper::task_from_row(&row);
                self.state.promote(&temp_id, task.clone());
                Ok(task)
            }
            Err(err) => {
                eprintln!("[taskdeck] create failed: id={temp_id} err={err}");
                self.state.fail(&temp_id, &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Applies a partial update optimistically. Unknown ids are a silent
    /// no-op (a caller bug, not a remote problem); an empty patch is
    /// answered locally without a wire round trip. A remote rejection
    /// rolls the entity back to its pre-mutation value and position.
    pub async fn update_task(
        &mut self,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>, EngineError> {
        let Some(previous) = self.state.get(id).cloned() else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(previous));
        }
        let position = self.state.position_of(id).unwrap_or(0);

        let mut optimistic = previous.clone();
        patch.apply_to(&mut optimistic);
        self.state.stage(optimistic);

        match self.update_with_degrade(id, &patch).await {
            Ok(row) => Ok(self.absorb_update_response(id, &row, &patch)),
            Err(err) => {
                eprintln!("[taskdeck] update failed: id={id} err={err}");
                self.state.rollback(previous, position, &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Re-attempts a failed operation. Temporary ids re-run the create
    /// flow from the still-visible optimistic task; durable ids push the
    /// entity's current local field values, the state the user last saw,
    /// and absorb the response like any other update.
    pub async fn retry_task(&mut self, id: &str) -> Result<Option<Task>, EngineError> {
        if self.state.status(id) != Some(SyncStatus::Failed) {
            return Ok(None);
        }
        let Some(current) = self.state.get(id).cloned() else {
            return Ok(None);
        };
        self.state.stage(current.clone());

        let outcome = if is_temp_id(id) {
            self.insert_task_with_degrade(&current).await
        } else {
            self.update_full_with_degrade(id, &current).await
        };

        match outcome {
            Ok(row) => {
                if is_temp_id(id) {
                    let task = mapper::task_from_row(&row);
                    self.state.promote(id, task.clone());
                    Ok(Some(task))
                } else {
                    // the full payload is itself a patch; re-assert it so
                    // a stale representation cannot revert what was sent
                    let patch = mapper::full_patch(&current);
                    Ok(self.absorb_update_response(id, &row, &patch))
                }
            }
            Err(err) => {
                eprintln!("[taskdeck] retry failed: id={id} err={err}");
                self.state.fail(id, &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Deletes remotely first; local state is only touched on success so a
    /// rejected delete leaves everything inspectable. Temporary ids never
    /// reached the server and are discarded locally.
    pub async fn delete_task(&mut self, id: &str) -> Result<(), EngineError> {
        if is_temp_id(id) {
            self.state.discard(id);
            return Ok(());
        }
        if let Err(err) = self.client.delete_task(id).await {
            eprintln!("[taskdeck] delete failed: id={id} err={err}");
            return Err(err.into());
        }
        self.state.discard(id);
        Ok(())
    }

    /// Applies one push notification. Deletes win unconditionally;
    /// upserts are idempotent confirmations.
    pub fn apply_task_change(&mut self, change: TaskChange) {
        match change.kind {
            ChangeKind::Delete => {
                if let Some(id) = change.old_id.as_deref() {
                    self.state.discard(id);
                }
            }
            ChangeKind::Insert | ChangeKind::Update => {
                if let Some(row) = change.new.as_ref() {
                    self.state.commit(mapper::task_from_row(row));
                }
            }
        }
    }

    pub fn apply_category_change(&mut self, change: CategoryChange) {
        self.categories.apply_change(change);
    }

    /// Fetches the scope's categories; an empty table is seeded with the
    /// defaults in a single multi-row insert.
    pub async fn refresh_categories(&mut self) -> Result<usize, EngineError> {
        let rows = self.client.list_categories().await?;
        let rows = if rows.is_empty() {
            let seeds: Vec<CategoryFields> = DEFAULT_CATEGORIES
                .iter()
                .map(|(label, color)| CategoryFields {
                    user_id: Some(self.scope.clone()),
                    name: Some((*label).to_string()),
                    color: Some((*color).to_string()),
                })
                .collect();
            self.client.insert_categories(&seeds).await?
        } else {
            rows
        };
        self.categories
            .replace_all(rows.iter().map(category_from_row).collect());
        Ok(self.categories.len())
    }

    /// Labels are unique case-insensitively within the scope; a duplicate
    /// returns the existing category without a remote call.
    pub async fn add_category(
        &mut self,
        label: &str,
        color: Option<&str>,
    ) -> Result<Category, EngineError> {
        let normalized = label.trim();
        if normalized.is_empty() {
            return Err(EngineError::EmptyLabel);
        }
        if let Some(existing) = self.categories.find_by_label(normalized) {
            return Ok(existing.clone());
        }

        let fields = CategoryFields {
            user_id: Some(self.scope.clone()),
            name: Some(normalized.to_lowercase()),
            color: Some(color.unwrap_or(FALLBACK_COLOR).to_string()),
        };
        let rows = self.client.insert_categories(&[fields]).await?;
        let row = rows.first().ok_or(BoardError::EmptyResponse)?;
        let category = category_from_row(row);
        self.categories.upsert(category.clone());
        Ok(category)
    }

    /// Removes the category row. Task rows keep any dangling reference;
    /// referential integrity lives in the remote store.
    pub async fn remove_category(&mut self, id: &str) -> Result<(), EngineError> {
        self.client.delete_category(id).await?;
        self.categories.remove(id);
        Ok(())
    }

    /// Success tail of the update flow. If the entity vanished while the
    /// call was in flight (a concurrent delete event), the late response
    /// is dropped instead of resurrecting the row. Otherwise the patched
    /// fields are re-asserted over the response: a stale read-after-write
    /// must not revert the very change just written.
    fn absorb_update_response(
        &mut self,
        id: &str,
        row: &TaskRow,
        patch: &TaskPatch,
    ) -> Option<Task> {
        if !self.state.contains(id) {
            return None;
        }
        let mut merged = mapper::task_from_row(row);
        patch.apply_to(&mut merged);
        self.state.commit(merged.clone());
        Some(merged)
    }

    async fn insert_with_degrade(&mut self, draft: &TaskDraft) -> Result<TaskRow, BoardError> {
        let include = self.categories_supported;
        let fields = mapper::draft_to_fields(draft, &self.scope, include);
        match self.client.insert_task(&fields).await {
            Err(err) if include && err.is_unknown_column(CATEGORIES_COLUMN) => {
                self.remember_categories_unsupported();
                let fields = mapper::draft_to_fields(draft, &self.scope, false);
                self.client.insert_task(&fields).await
            }
            other => other,
        }
    }

    async fn insert_task_with_degrade(&mut self, task: &Task) -> Result<TaskRow, BoardError> {
        let include = self.categories_supported;
        let fields = mapper::task_to_fields(task, Some(&self.scope), include);
        match self.client.insert_task(&fields).await {
            Err(err) if include && err.is_unknown_column(CATEGORIES_COLUMN) => {
                self.remember_categories_unsupported();
                let fields = mapper::task_to_fields(task, Some(&self.scope), false);
                self.client.insert_task(&fields).await
            }
            other => other,
        }
    }

    async fn update_with_degrade(
        &mut self,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<TaskRow, BoardError> {
        let include = self.categories_supported;
        let fields = mapper::patch_to_fields(patch, include);
        match self.client.update_task(id, &fields).await {
            Err(err)
                if include
                    && patch.categories.is_some()
                    && err.is_unknown_column(CATEGORIES_COLUMN) =>
            {
                self.remember_categories_unsupported();
                let fields = mapper::patch_to_fields(patch, false);
                self.client.update_task(id, &fields).await
            }
            other => other,
        }
    }

    async fn update_full_with_degrade(
        &mut self,
        id: &str,
        task: &Task,
    ) -> Result<TaskRow, BoardError> {
        let include = self.categories_supported;
        let fields = mapper::task_to_fields(task, None, include);
        match self.client.update_task(id, &fields).await {
            Err(err) if include && err.is_unknown_column(CATEGORIES_COLUMN) => {
                self.remember_categories_unsupported();
                let fields = mapper::task_to_fields(task, None, false);
                self.client.update_task(id, &fields).await
            }
            other => other,
        }
    }

    fn remember_categories_unsupported(&mut self) {
        self.categories_supported = false;
        eprintln!("[taskdeck] remote schema rejected the categories column; omitting it from now on");
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
