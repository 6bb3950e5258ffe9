use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    Syncing,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StatusEntry {
    status: SyncStatus,
    error: Option<String>,
}

/// Per-entity confirmation state, keyed by task identifier (temporary ids
/// included). Entries must be cleared when the entity leaves the replica,
/// and rekeyed when a temporary id is promoted to a durable one.
#[derive(Debug, Default)]
pub struct StatusLedger {
    entries: HashMap<String, StatusEntry>,
}

impl StatusLedger {
    pub fn set_status(&mut self, id: &str, status: SyncStatus, error: Option<&str>) {
        self.entries.insert(
            id.to_string(),
            StatusEntry {
                status,
                error: error.map(str::to_string),
            },
        );
    }

    pub fn status(&self, id: &str) -> Option<SyncStatus> {
        self.entries.get(id).map(|entry| entry.status)
    }

    pub fn error_message(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.error.as_deref())
    }

    pub fn clear(&mut self, id: &str) {
        self.entries.remove(id);
    }

    /// Moves the entry for a promoted entity under its durable id and
    /// drops the temporary key.
    pub fn rekey(&mut self, old_id: &str, new_id: &str) {
        if let Some(entry) = self.entries.remove(old_id) {
            self.entries.insert(new_id.to_string(), entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_status_with_message() {
        let mut ledger = StatusLedger::default();
        ledger.set_status("t-1", SyncStatus::Failed, Some("network error"));

        assert_eq!(ledger.status("t-1"), Some(SyncStatus::Failed));
        assert_eq!(ledger.error_message("t-1"), Some("network error"));
        assert_eq!(ledger.status("t-2"), None);
    }

    #[test]
    fn overwriting_a_status_replaces_the_message() {
        let mut ledger = StatusLedger::default();
        ledger.set_status("t-1", SyncStatus::Failed, Some("network error"));
        ledger.set_status("t-1", SyncStatus::Synced, None);

        assert_eq!(ledger.status("t-1"), Some(SyncStatus::Synced));
        assert_eq!(ledger.error_message("t-1"), None);
    }

    #[test]
    fn rekey_moves_the_entry_and_drops_the_old_key() {
        let mut ledger = StatusLedger::default();
        ledger.set_status("local-1", SyncStatus::Syncing, None);
        ledger.rekey("local-1", "t-1");

        assert_eq!(ledger.status("local-1"), None);
        assert_eq!(ledger.status("t-1"), Some(SyncStatus::Syncing));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn clear_removes_the_entry() {
        let mut ledger = StatusLedger::default();
        ledger.set_status("t-1", SyncStatus::Synced, None);
        ledger.clear("t-1");

        assert!(ledger.is_empty());
    }
}
