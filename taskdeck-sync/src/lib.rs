pub mod sync;

pub use sync::categories::{Category, CategoryBoard};
pub use sync::engine::{EngineError, SyncEngine, is_temp_id};
pub use sync::ledger::{StatusLedger, SyncStatus};
pub use sync::mapper::{Priority, Task, TaskDraft, TaskPatch, TaskStatus};
pub use sync::replica::{BoardStats, ReplicaStore};
pub use sync::state::BoardState;
