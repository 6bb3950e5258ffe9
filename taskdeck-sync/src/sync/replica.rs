use super::mapper::{Task, TaskStatus};

/// Aggregate counts over the active board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    pub total: usize,
    pub backlog: usize,
    pub active: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// In-memory ground truth the UI reads: one ordered list of active tasks,
/// one of archived tasks. A task lives in exactly one of the two, decided
/// solely by `archived_at`.
#[derive(Debug, Default)]
pub struct ReplicaStore {
    active: Vec<Task>,
    archived: Vec<Task>,
}

impl ReplicaStore {
    pub fn tasks(&self) -> &[Task] {
        &self.active
    }

    pub fn archived_tasks(&self) -> &[Task] {
        &self.archived
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.archived.iter())
            .find(|task| task.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Inserts or replaces. A replace in the same collection keeps the
    /// task's position so edits do not make rows jump around; switching
    /// collections (or a brand-new id) lands at the front.
    pub fn upsert(&mut self, task: Task) {
        let (target, other) = if task.is_archived() {
            (&mut self.archived, &mut self.active)
        } else {
            (&mut self.active, &mut self.archived)
        };
        other.retain(|existing| existing.id != task.id);
        match target.iter().position(|existing| existing.id == task.id) {
            Some(index) => target[index] = task,
            None => target.insert(0, task),
        }
    }

    /// Index of the task within the collection that currently holds it.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.active
            .iter()
            .position(|task| task.id == id)
            .or_else(|| self.archived.iter().position(|task| task.id == id))
    }

    /// Puts a task back at a specific index in its collection, removing
    /// any other copy first. Undoes an optimistic move; a plain `upsert`
    /// after a collection switch would land the task at the front.
    pub fn restore_at(&mut self, index: usize, task: Task) {
        self.active.retain(|existing| existing.id != task.id);
        self.archived.retain(|existing| existing.id != task.id);
        let target = if task.is_archived() {
            &mut self.archived
        } else {
            &mut self.active
        };
        target.insert(index.min(target.len()), task);
    }

    /// Removes from both collections. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.active.len() + self.archived.len();
        self.active.retain(|task| task.id != id);
        self.archived.retain(|task| task.id != id);
        before != self.active.len() + self.archived.len()
    }

    /// Rebuilds both collections from a full remote snapshot, preserving
    /// the given (most-recent-first) order.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.active.clear();
        self.archived.clear();
        for task in tasks {
            if task.is_archived() {
                self.archived.push(task);
            } else {
                self.active.push(task);
            }
        }
    }

    pub fn stats(&self) -> BoardStats {
        let total = self.active.len();
        let completed = self
            .active
            .iter()
            .filter(|task| task.is_complete)
            .count();
        let active = self
            .active
            .iter()
            .filter(|task| !task.is_complete && task.status == TaskStatus::Active)
            .count();
        let backlog = self
            .active
            .iter()
            .filter(|task| !task.is_complete && task.status == TaskStatus::Backlog)
            .count();
        BoardStats {
            total,
            backlog,
            active,
            completed,
            remaining: total - completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::mapper::Priority;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            status: TaskStatus::Backlog,
            priority: Priority::Medium,
            is_complete: false,
            archived_at: None,
            activated_at: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
            due_date: None,
            categories: Vec::new(),
        }
    }

    fn archived(id: &str) -> Task {
        let mut task = task(id);
        task.archived_at = Some("2024-05-01T00:00:00Z".into());
        task
    }

    #[test]
    fn new_tasks_insert_at_the_front() {
        let mut store = ReplicaStore::default();
        store.upsert(task("t-1"));
        store.upsert(task("t-2"));

        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-2", "t-1"]);
    }

    #[test]
    fn updating_an_existing_task_keeps_its_position() {
        let mut store = ReplicaStore::default();
        store.upsert(task("t-1"));
        store.upsert(task("t-2"));
        store.upsert(task("t-3"));

        let mut edited = task("t-1");
        edited.title = "edited".into();
        store.upsert(edited);

        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-3", "t-2", "t-1"]);
        assert_eq!(store.get("t-1").unwrap().title, "edited");
    }

    #[test]
    fn archived_at_alone_decides_membership() {
        let mut store = ReplicaStore::default();
        store.upsert(task("t-1"));
        store.upsert(archived("t-1"));

        assert!(store.tasks().is_empty());
        assert_eq!(store.archived_tasks().len(), 1);

        store.upsert(task("t-1"));
        assert_eq!(store.tasks().len(), 1);
        assert!(store.archived_tasks().is_empty());
    }

    #[test]
    fn repeated_upserts_are_idempotent() {
        let mut store = ReplicaStore::default();
        store.upsert(archived("t-1"));
        store.upsert(archived("t-1"));

        assert!(store.tasks().is_empty());
        assert_eq!(store.archived_tasks().len(), 1);
    }

    #[test]
    fn restore_at_reverses_an_optimistic_collection_switch() {
        let mut store = ReplicaStore::default();
        store.upsert(task("t-1"));
        store.upsert(task("t-2"));
        store.upsert(task("t-3"));
        let index = store.position_of("t-1").unwrap();
        assert_eq!(index, 2);

        store.upsert(archived("t-1"));
        store.restore_at(index, task("t-1"));

        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-3", "t-2", "t-1"]);
        assert!(store.archived_tasks().is_empty());
    }

    #[test]
    fn restore_at_clamps_an_out_of_range_index() {
        let mut store = ReplicaStore::default();
        store.restore_at(5, task("t-1"));

        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.position_of("t-1"), Some(0));
    }

    #[test]
    fn remove_clears_both_collections() {
        let mut store = ReplicaStore::default();
        store.upsert(task("t-1"));
        store.upsert(archived("t-2"));

        assert!(store.remove("t-1"));
        assert!(store.remove("t-2"));
        assert!(!store.remove("t-3"));
        assert!(!store.contains("t-1"));
    }

    #[test]
    fn replace_all_preserves_snapshot_order() {
        let mut store = ReplicaStore::default();
        store.upsert(task("stale"));
        store.replace_all(vec![task("t-3"), archived("t-2"), task("t-1")]);

        let ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-3", "t-1"]);
        assert_eq!(store.archived_tasks()[0].id, "t-2");
        assert!(!store.contains("stale"));
    }

    #[test]
    fn stats_count_only_the_active_board() {
        let mut store = ReplicaStore::default();
        let mut done = task("t-1");
        done.status = TaskStatus::Completed;
        done.is_complete = true;
        let mut working = task("t-2");
        working.status = TaskStatus::Active;
        store.upsert(done);
        store.upsert(working);
        store.upsert(task("t-3"));
        store.upsert(archived("t-4"));

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.backlog, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.remaining, 2);
    }
}
