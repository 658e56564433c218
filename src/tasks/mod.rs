//! Asynchronous write subsystem.
//!
//! # Data Flow
//! ```text
//! POST /dialogues/async
//!     → registry.submit() records Working, returns task id (202)
//!     → spawned task: sleep(write_delay) → DialogueStore::insert
//!     → Done { dialogue_id } | Failed { error }
//!
//! GET /dialogues/async_check/{id}
//!     → registry.status()
//!
//! Sweeper (interval):
//!     → evict terminal tasks older than ttl
//! ```
//!
//! # Design Decisions
//! - Registry is owned by AppState, not a process global
//! - DashMap gives concurrent reads and writes without a global lock
//! - No cancellation and no retries; state is lost on restart

pub mod registry;
pub mod types;

pub use registry::TaskRegistry;
pub use types::{TaskCounts, TaskState, TaskStatus};
