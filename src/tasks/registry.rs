//! In-memory registry of deferred dialogue writes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::observability::metrics;
use crate::store::{DialogueStore, NewDialogue};
use crate::tasks::types::{TaskCounts, TaskState, TaskStatus};

/// Tracks deferred writes from submission to completion.
///
/// Cloning is cheap; clones share the same map. Entries leave the map only
/// through [`TaskRegistry::sweep_expired`].
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<DashMap<Uuid, TaskState>>,
    store: DialogueStore,
    write_delay: Duration,
}

impl TaskRegistry {
    pub fn new(store: DialogueStore, write_delay: Duration) -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
            store,
            write_delay,
        }
    }

    /// Accept a dialogue for deferred writing and return its task id.
    ///
    /// The write runs on its own tokio task and outlives the calling request.
    pub fn submit(&self, new: NewDialogue) -> Uuid {
        let task_id = loop {
            let candidate = Uuid::new_v4();
            if let Entry::Vacant(slot) = self.tasks.entry(candidate) {
                slot.insert(TaskState::working());
                break candidate;
            }
        };

        metrics::record_task_event("submitted");
        metrics::record_tasks_tracked(self.tasks.len());
        tracing::debug!(task_id = %task_id, user_id = new.user_id, "Deferred write accepted");

        let registry = self.clone();
        tokio::spawn(async move {
            registry.run_deferred_write(task_id, new).await;
        });

        task_id
    }

    async fn run_deferred_write(&self, task_id: Uuid, new: NewDialogue) {
        tokio::time::sleep(self.write_delay).await;

        match self.store.insert(new).await {
            Ok(dialogue) => {
                tracing::info!(task_id = %task_id, dialogue_id = dialogue.id, "Deferred write done");
                self.finish(task_id, TaskStatus::Done { dialogue_id: dialogue.id });
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Deferred write failed");
                self.finish(task_id, TaskStatus::Failed { error: e.to_string() });
            }
        }
    }

    fn finish(&self, task_id: Uuid, status: TaskStatus) {
        let event = status.as_str();
        if let Some(mut entry) = self.tasks.get_mut(&task_id) {
            if !entry.status.is_terminal() {
                entry.status = status;
                entry.finished_at = Some(Instant::now());
                metrics::record_task_event(event);
            }
        }
    }

    /// Current state of a task, or `None` if it was never submitted or has been evicted.
    pub fn status(&self, task_id: &Uuid) -> Option<TaskState> {
        self.tasks.get(task_id).map(|r| r.value().clone())
    }

    /// Drop terminal tasks that finished at least `ttl` ago. Returns how many were removed.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.tasks.retain(|_, state| {
            let expired = state.is_expired(ttl, now);
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            for _ in 0..removed {
                metrics::record_task_event("evicted");
            }
            tracing::debug!(removed, remaining = self.tasks.len(), "Swept finished tasks");
        }
        metrics::record_tasks_tracked(self.tasks.len());
        removed
    }

    /// Run `sweep_expired` every `interval` until `shutdown` fires.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        ttl: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        registry.sweep_expired(ttl);
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Task sweeper stopping");
                        break;
                    }
                }
            }
        })
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for r in self.tasks.iter() {
            match r.value().status {
                TaskStatus::Working => counts.working += 1,
                TaskStatus::Done { .. } => counts.done += 1,
                TaskStatus::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::store::testing::TestDatabase;

    fn sample(content: &str) -> NewDialogue {
        NewDialogue {
            user_id: 1,
            conversation_id: "c1".into(),
            speaker: "bot".into(),
            content: content.into(),
        }
    }

    async fn wait_terminal(registry: &TaskRegistry, task_id: Uuid) -> TaskStatus {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let state = registry.status(&task_id).expect("task tracked");
                if state.status.is_terminal() {
                    return state.status;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("task did not finish in time")
    }

    #[tokio::test]
    async fn test_submit_starts_working_then_done() {
        let db = TestDatabase::new().await;
        let registry = TaskRegistry::new(db.store(), Duration::from_millis(200));

        let task_id = registry.submit(sample("hi"));
        assert_eq!(registry.status(&task_id).unwrap().status, TaskStatus::Working);

        let dialogue_id = match wait_terminal(&registry, task_id).await {
            TaskStatus::Done { dialogue_id } => dialogue_id,
            other => panic!("expected done, got {:?}", other),
        };
        let stored = db.store().get_by_id(dialogue_id).await.unwrap();
        assert_eq!(stored.content, "hi");
        assert!(registry.status(&task_id).unwrap().finished_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_task_is_none() {
        let db = TestDatabase::new().await;
        let registry = TaskRegistry::new(db.store(), Duration::ZERO);
        assert!(registry.status(&Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_submissions() {
        let db = TestDatabase::new().await;
        let registry = TaskRegistry::new(db.store(), Duration::from_millis(20));

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.submit(sample(&format!("msg {i}"))) })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 50);

        let mut dialogue_ids = HashSet::new();
        for id in &ids {
            match wait_terminal(&registry, *id).await {
                TaskStatus::Done { dialogue_id } => {
                    dialogue_ids.insert(dialogue_id);
                }
                other => panic!("task {id} ended as {:?}", other),
            }
        }
        assert_eq!(dialogue_ids.len(), 50);
        assert_eq!(registry.counts().done, 50);
        assert_eq!(db.store().get_all().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_failed_write_is_visible() {
        let db = TestDatabase::new().await;
        let registry = TaskRegistry::new(db.store(), Duration::ZERO);
        db.pool().close().await;

        let task_id = registry.submit(sample("lost"));
        let status = wait_terminal(&registry, task_id).await;
        assert!(matches!(status, TaskStatus::Failed { .. }));
        assert_eq!(registry.counts().failed, 1);
    }

    #[tokio::test]
    async fn test_sweep_keeps_working_tasks() {
        let db = TestDatabase::new().await;
        let fast = TaskRegistry::new(db.store(), Duration::ZERO);
        let done_id = fast.submit(sample("quick"));
        wait_terminal(&fast, done_id).await;

        // Shares the map but parks its writes for an hour.
        let slow = TaskRegistry {
            write_delay: Duration::from_secs(3600),
            ..fast.clone()
        };
        let pending_id = slow.submit(sample("slow"));

        assert_eq!(fast.sweep_expired(Duration::from_secs(3600)), 0);
        assert_eq!(fast.sweep_expired(Duration::ZERO), 1);
        assert!(fast.status(&done_id).is_none());
        assert_eq!(fast.status(&pending_id).unwrap().status, TaskStatus::Working);
        assert_eq!(fast.len(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let db = TestDatabase::new().await;
        let registry = TaskRegistry::new(db.store(), Duration::ZERO);
        let (tx, rx) = broadcast::channel(1);

        let handle = registry.spawn_sweeper(Duration::from_millis(10), Duration::ZERO, rx);
        let task_id = registry.submit(sample("swept"));
        wait_terminal(&registry, task_id).await;

        tokio::time::timeout(Duration::from_secs(5), async {
            while !registry.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("sweeper never evicted the finished task");

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
