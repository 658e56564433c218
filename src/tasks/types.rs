//! Deferred write task state.

use std::time::{Duration, Instant};

/// Lifecycle of a deferred write.
///
/// ```text
/// Working ──insert ok──▶ Done
///    └────insert err──▶ Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Accepted; the write has not completed yet.
    Working,
    /// The dialogue was stored.
    Done { dialogue_id: i64 },
    /// The write failed and will not be retried.
    Failed { error: String },
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Working => "working",
            TaskStatus::Done { .. } => "done",
            TaskStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Working)
    }
}

/// Registry entry for one task.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub status: TaskStatus,
    pub created_at: Instant,
    /// Set exactly once, on the transition out of `Working`.
    pub finished_at: Option<Instant>,
}

impl TaskState {
    pub(crate) fn working() -> Self {
        Self {
            status: TaskStatus::Working,
            created_at: Instant::now(),
            finished_at: None,
        }
    }

    /// Terminal tasks older than `ttl` may be evicted; working tasks never are.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        match self.finished_at {
            Some(finished) => now.saturating_duration_since(finished) >= ttl,
            None => false,
        }
    }
}

/// Snapshot of how many tracked tasks sit in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub working: usize,
    pub done: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_never_expires() {
        let state = TaskState::working();
        let later = Instant::now() + Duration::from_secs(86_400);
        assert!(!state.is_expired(Duration::ZERO, later));
    }

    #[test]
    fn test_terminal_expiry() {
        let now = Instant::now();
        let state = TaskState {
            status: TaskStatus::Done { dialogue_id: 1 },
            created_at: now,
            finished_at: Some(now),
        };
        assert!(!state.is_expired(Duration::from_secs(60), now + Duration::from_secs(30)));
        assert!(state.is_expired(Duration::from_secs(60), now + Duration::from_secs(60)));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(TaskStatus::Working.as_str(), "working");
        assert_eq!(TaskStatus::Done { dialogue_id: 2 }.as_str(), "done");
        assert_eq!(TaskStatus::Failed { error: "x".into() }.as_str(), "failed");
        assert!(!TaskStatus::Working.is_terminal());
    }
}
