//! Pooled access to the `dialogues` table.

use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};

use crate::store::is_sqlite_pool;
use crate::store::types::{Dialogue, DialogueFilter, NewDialogue, StoreError, StoreResult};

const SELECT_COLUMNS: &str = "SELECT id, user_id, conversation_id, speaker, content FROM dialogues";
const INSERT: &str =
    "INSERT INTO dialogues (user_id, conversation_id, speaker, content) VALUES (?, ?, ?, ?)";
// The SQLite Any driver never reports a last insert id.
const INSERT_RETURNING_ID: &str =
    "INSERT INTO dialogues (user_id, conversation_id, speaker, content) VALUES (?, ?, ?, ?) RETURNING id";

/// Record store for dialogues.
///
/// Every operation is one parameterized statement on a pooled connection.
/// Cloning is cheap; clones share the pool.
#[derive(Clone, Debug)]
pub struct DialogueStore {
    pool: AnyPool,
    returning_id: bool,
}

impl DialogueStore {
    pub fn new(pool: AnyPool) -> Self {
        let returning_id = is_sqlite_pool(&pool);
        Self { pool, returning_id }
    }

    /// Insert one dialogue and return it with its assigned id.
    pub async fn insert(&self, new: NewDialogue) -> StoreResult<Dialogue> {
        let sql = if self.returning_id { INSERT_RETURNING_ID } else { INSERT };
        let query = sqlx::query(sql)
            .bind(new.user_id)
            .bind(&new.conversation_id)
            .bind(&new.speaker)
            .bind(&new.content);

        let id: i64 = if self.returning_id {
            query.fetch_one(&self.pool).await?.try_get("id")?
        } else {
            query
                .execute(&self.pool)
                .await?
                .last_insert_id()
                .ok_or(StoreError::MissingInsertId)?
        };
        tracing::debug!(dialogue_id = id, user_id = new.user_id, "Dialogue inserted");

        Ok(new.with_id(id))
    }

    /// Fetch a single dialogue.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Dialogue> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(dialogue_from_row(&row)?),
            None => Err(StoreError::NotFound { id }),
        }
    }

    /// Every stored dialogue.
    pub async fn get_all(&self) -> StoreResult<Vec<Dialogue>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        collect_rows(rows, DialogueFilter::All)
    }

    /// Dialogues written by one user.
    pub async fn get_by_user_id(&self, user_id: i64) -> StoreResult<Vec<Dialogue>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE user_id = ? ORDER BY id"))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect_rows(rows, DialogueFilter::User(user_id))
    }

    /// Dialogues belonging to one conversation.
    pub async fn get_by_conversation_id(&self, conversation_id: &str) -> StoreResult<Vec<Dialogue>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE conversation_id = ? ORDER BY id"))
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;
        collect_rows(rows, DialogueFilter::Conversation(conversation_id.to_string()))
    }
}

fn collect_rows(rows: Vec<AnyRow>, filter: DialogueFilter) -> StoreResult<Vec<Dialogue>> {
    if rows.is_empty() {
        return Err(StoreError::EmptyResult { filter });
    }
    rows.iter()
        .map(|row| dialogue_from_row(row).map_err(StoreError::from))
        .collect()
}

fn dialogue_from_row(row: &AnyRow) -> Result<Dialogue, sqlx::Error> {
    Ok(Dialogue {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        conversation_id: row.try_get("conversation_id")?,
        speaker: row.try_get("speaker")?,
        content: row.try_get("content")?,
    })
}
