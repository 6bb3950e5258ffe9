use super::ledger::{StatusLedger, SyncStatus};
use super::mapper::Task;
use super::replica::{BoardStats, ReplicaStore};

/// Replica and ledger behind one interface so a call site cannot update
/// one half and forget the other. Every mutation here keeps the pair
/// consistent.
#[derive(Debug, Default)]
pub struct BoardState {
    replica: ReplicaStore,
    ledger: StatusLedger,
}

impl BoardState {
    /// Optimistic apply: the task becomes visible immediately and is
    /// marked as awaiting confirmation.
    pub fn stage(&mut self, task: Task) {
        let id = task.id.clone();
        self.replica.upsert(task);
        self.ledger.set_status(&id, SyncStatus::Syncing, None);
    }

    /// Confirmed upsert. Idempotent: committing the same task twice leaves
    /// the same observable state.
    pub fn commit(&mut self, task: Task) {
        let id = task.id.clone();
        self.replica.upsert(task);
        self.ledger.set_status(&id, SyncStatus::Synced, None);
    }

    /// Marks a failure without touching the replica (create path: the
    /// optimistic task stays visible for retry or discard).
    pub fn fail(&mut self, id: &str, message: &str) {
        self.ledger.set_status(id, SyncStatus::Failed, Some(message));
    }

    /// Restores the pre-mutation value at its pre-mutation position and
    /// records the failure (update path: rollback is mandatory because a
    /// known-good state existed). The caller captures `position` via
    /// `position_of` before staging; staging an archive or unarchive
    /// moves the task between collections, and a plain upsert on the way
    /// back would land it at the front instead of where it was.
    pub fn rollback(&mut self, previous: Task, position: usize, message: &str) {
        let id = previous.id.clone();
        self.replica.restore_at(position, previous);
        self.fail(&id, message);
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.replica.position_of(id)
    }

    /// Replaces a temporary entity with the durable one the server
    /// returned. Both the temporary id and the durable id are removed
    /// first: a realtime insert for the durable id may already have
    /// landed, and promoting must not leave two rows.
    pub fn promote(&mut self, temp_id: &str, task: Task) {
        let id = task.id.clone();
        self.replica.remove(temp_id);
        self.replica.remove(&id);
        self.replica.upsert(task);
        self.ledger.rekey(temp_id, &id);
        self.ledger.set_status(&id, SyncStatus::Synced, None);
    }

    /// Confirmed removal: entity and ledger entry both go.
    pub fn discard(&mut self, id: &str) {
        self.replica.remove(id);
        self.ledger.clear(id);
    }

    /// Scope teardown: back to empty state.
    pub fn reset(&mut self) {
        *self = BoardState::default();
    }

    /// Adopts a full remote snapshot, dropping all transient state.
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.ledger = StatusLedger::default();
        self.replica.replace_all(tasks);
    }

    pub fn tasks(&self) -> &[Task] {
        self.replica.tasks()
    }

    pub fn archived_tasks(&self) -> &[Task] {
        self.replica.archived_tasks()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.replica.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.replica.contains(id)
    }

    pub fn stats(&self) -> BoardStats {
        self.replica.stats()
    }

    pub fn status(&self, id: &str) -> Option<SyncStatus> {
        self.ledger.status(id)
    }

    pub fn error_message(&self, id: &str) -> Option<&str> {
        self.ledger.error_message(id)
    }

    #[cfg(test)]
    pub(crate) fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }
}
