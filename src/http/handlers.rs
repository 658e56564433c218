//! Dialogue and task endpoint handlers.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::extract::{ApiPath, ApiQuery};
use crate::http::request::PageParams;
use crate::http::response::{BasicResponse, DialogueResponse, Links, Page, TaskResponse};
use crate::http::server::AppState;
use crate::store::{Dialogue, NewDialogue, StoreError, StoreResult};

/// `GET /`: identifies the service.
pub async fn root() -> Json<BasicResponse> {
    Json(BasicResponse {
        message: "hello world from dialogues microservice".to_string(),
        links: Links::new(),
    })
}

/// `GET /dialogues/{id}`
pub async fn get_dialogue(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let dialogue = state.store.get_by_id(id).await?;
    Ok(Json(dialogue.into()))
}

/// `GET /dialogues`
pub async fn list_dialogues(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<DialogueResponse>>, ApiError> {
    let (page, size) = params.resolve(&state.api)?;
    let dialogues = collection(&state, state.store.get_all().await)?;
    Ok(Json(Page::paginate(to_responses(dialogues), page, size)))
}

/// `POST /dialogues?user_id=&conversation_id=&speaker=&content=`
pub async fn create_dialogue(
    State(state): State<AppState>,
    ApiQuery(new): ApiQuery<NewDialogue>,
) -> Result<(StatusCode, Json<DialogueResponse>), ApiError> {
    if state.api.sync_write_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.api.sync_write_delay_ms)).await;
    }
    let dialogue = state.store.insert(new).await?;
    tracing::info!(dialogue_id = dialogue.id, "Dialogue created");
    Ok((StatusCode::CREATED, Json(dialogue.into())))
}

/// `GET /dialogues/from_user/{user_id}`
pub async fn dialogues_from_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<DialogueResponse>>, ApiError> {
    let (page, size) = params.resolve(&state.api)?;
    let dialogues = collection(&state, state.store.get_by_user_id(user_id).await)?;
    Ok(Json(Page::paginate(to_responses(dialogues), page, size)))
}

/// `GET /dialogues/from_conversation/{conversation_id}`. Not paginated.
pub async fn dialogues_from_conversation(
    State(state): State<AppState>,
    ApiPath(conversation_id): ApiPath<String>,
) -> Result<Json<Vec<DialogueResponse>>, ApiError> {
    let result = state.store.get_by_conversation_id(&conversation_id).await;
    let dialogues = collection(&state, result)?;
    Ok(Json(to_responses(dialogues)))
}

/// `POST /dialogues/async?...`: accept now, write later.
pub async fn submit_dialogue(
    State(state): State<AppState>,
    ApiQuery(new): ApiQuery<NewDialogue>,
) -> (StatusCode, Json<TaskResponse>) {
    let task_id = state.tasks.submit(new);
    (StatusCode::ACCEPTED, Json(TaskResponse::accepted(task_id)))
}

/// `GET /dialogues/async_check/{task_id}`
pub async fn check_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    // A malformed id can never have been issued, so it is unknown rather than invalid.
    let id = Uuid::parse_str(&task_id).map_err(|_| ApiError::UnknownTask(task_id.clone()))?;
    let task = state.tasks.status(&id).ok_or(ApiError::UnknownTask(task_id))?;
    Ok(Json(TaskResponse::from_status(id, &task.status)))
}

/// Apply the empty-collection policy to a collection lookup.
fn collection(state: &AppState, result: StoreResult<Vec<Dialogue>>) -> Result<Vec<Dialogue>, ApiError> {
    match result {
        Err(StoreError::EmptyResult { .. }) if !state.api.empty_list_is_error => Ok(Vec::new()),
        other => Ok(other?),
    }
}

fn to_responses(dialogues: Vec<Dialogue>) -> Vec<DialogueResponse> {
    dialogues.into_iter().map(DialogueResponse::from).collect()
}
