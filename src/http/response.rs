//! Response bodies.
//!
//! Every non-paginated body carries a `links` map of related paths.
//! Paginated lists are wrapped in [`Page`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Dialogue;
use crate::tasks::TaskStatus;

/// Relation name → path.
pub type Links = BTreeMap<String, String>;

pub fn dialogue_path(id: i64) -> String {
    format!("/dialogues/{}", id)
}

pub fn task_status_path(task_id: &Uuid) -> String {
    format!("/dialogues/async_check/{}", task_id)
}

/// Plain message plus links.
#[derive(Debug, Serialize, Deserialize)]
pub struct BasicResponse {
    pub message: String,
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub id: i64,
    pub user_id: i64,
    pub conversation_id: String,
    pub speaker: String,
    pub content: String,
    pub links: Links,
}

impl From<Dialogue> for DialogueResponse {
    fn from(d: Dialogue) -> Self {
        let links = Links::from([("get".to_string(), dialogue_path(d.id))]);
        Self {
            id: d.id,
            user_id: d.user_id,
            conversation_id: d.conversation_id,
            speaker: d.speaker,
            content: d.content,
            links,
        }
    }
}

/// Body for task submission and status polling.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task_id: Uuid,
    /// `working`, `done` or `failed`.
    pub status: String,
    pub links: Links,
}

impl TaskResponse {
    pub fn accepted(task_id: Uuid) -> Self {
        Self {
            message: "successfully accepted post for dialogue".to_string(),
            task_id,
            status: TaskStatus::Working.as_str().to_string(),
            links: Links::from([("status".to_string(), task_status_path(&task_id))]),
        }
    }

    pub fn from_status(task_id: Uuid, status: &TaskStatus) -> Self {
        let mut links = Links::from([("status".to_string(), task_status_path(&task_id))]);
        let message = match status {
            TaskStatus::Working => format!("task {} still in progress", task_id),
            TaskStatus::Done { dialogue_id } => {
                links.insert("get".to_string(), dialogue_path(*dialogue_id));
                format!("task {} has completed", task_id)
            }
            TaskStatus::Failed { .. } => format!("task {} failed", task_id),
        };
        Self {
            message,
            task_id,
            status: status.as_str().to_string(),
            links,
        }
    }
}

/// One page of a larger result set.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    /// Slice page `page` (1-based) of `size` items out of `all`.
    pub fn paginate(all: Vec<T>, page: u32, size: u32) -> Self {
        let total = all.len();
        let size_usize = size.max(1) as usize;
        let pages = u32::try_from(total.div_ceil(size_usize)).unwrap_or(u32::MAX);
        let skip = (page.saturating_sub(1) as usize).saturating_mul(size_usize);
        let items = all.into_iter().skip(skip).take(size_usize).collect();
        Self {
            items,
            total,
            page,
            size,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_links_to_itself() {
        let response = DialogueResponse::from(Dialogue {
            id: 1,
            user_id: 1,
            conversation_id: "c1".into(),
            speaker: "bot".into(),
            content: "hi".into(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "user_id": 1,
                "conversation_id": "c1",
                "speaker": "bot",
                "content": "hi",
                "links": { "get": "/dialogues/1" }
            })
        );
    }

    #[test]
    fn test_paginate_slices() {
        let page = Page::paginate((1..=7).collect::<Vec<_>>(), 2, 3);
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert_eq!(page.pages, 3);

        let last = Page::paginate((1..=7).collect::<Vec<_>>(), 3, 3);
        assert_eq!(last.items, vec![7]);

        let past_end = Page::paginate((1..=7).collect::<Vec<_>>(), 9, 3);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 7);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<i32> = Page::paginate(Vec::new(), 1, 50);
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
    }

    #[test]
    fn test_task_messages() {
        let id = Uuid::new_v4();
        let working = TaskResponse::from_status(id, &TaskStatus::Working);
        assert_eq!(working.message, format!("task {} still in progress", id));
        assert!(!working.links.contains_key("get"));

        let done = TaskResponse::from_status(id, &TaskStatus::Done { dialogue_id: 12 });
        assert_eq!(done.status, "done");
        assert_eq!(done.links["get"], "/dialogues/12");
        assert_eq!(done.links["status"], format!("/dialogues/async_check/{}", id));
    }
}
