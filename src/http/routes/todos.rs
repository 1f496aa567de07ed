use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::Uri;
use axum::response::Response;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::application::todo_service::TodoService;
use crate::domain::todo::{CreateTodo, TodoId};
use crate::http::messages::Outcome;
use crate::http::types::{send_success, ApiError};

const TODO_NOT_FOUND: &str = "Todo not found";

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

/// Builds the todo routes under `prefix`. The list answers on both `{prefix}` and `{prefix}/`.
pub fn router<S: TodoService + Clone>(state: AppState<S>, prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    let list = get(list_todos::<S>);
    let mut router: Router<AppState<S>> = Router::new().route(&format!("{prefix}/"), list.clone());
    if !prefix.is_empty() {
        router = router.route(prefix, list);
    }
    router
        .route(&format!("{prefix}/todos"), post(create_todo::<S>))
        .route(&format!("{prefix}/todos/complete"), patch(complete_todos::<S>).fallback(segment_as_id))
        .route(&format!("{prefix}/todos/update-text"), patch(update_text::<S>).fallback(segment_as_id))
        .route(&format!("{prefix}/todos/:id"), put(edit_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CompleteBody { pub ids: Vec<TodoId> }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextBody {
    /// Missing is treated as empty, which matches every todo.
    #[serde(default)]
    pub keyword: String,
    pub new_text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditTodoBody { pub text: String }

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, payload: Result<Json<CreateTodo>, JsonRejection>) -> Result<Response, ApiError> {
    let input = body(payload)?;
    let todo = state.service.create(input).await?;
    tracing::info!(id = %todo.id, "todo created");
    Ok(send_success(Outcome::Successful, todo))
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Response, ApiError> {
    let todos = state.service.list().await?;
    Ok(send_success(Outcome::Successful, todos))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let removed = state.service.remove(id).await?.ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;
    tracing::info!(%id, "todo removed");
    Ok(send_success(Outcome::SuccessfulDelete, removed))
}

async fn complete_todos<S: TodoService>(State(state): State<AppState<S>>, payload: Result<Json<CompleteBody>, JsonRejection>) -> Result<Response, ApiError> {
    let CompleteBody { ids } = body(payload)?;
    let result = state.service.complete(ids).await?;
    Ok(send_success(Outcome::SuccessfulUpdate, result))
}

async fn update_text<S: TodoService>(State(state): State<AppState<S>>, payload: Result<Json<UpdateTextBody>, JsonRejection>) -> Result<Response, ApiError> {
    let UpdateTextBody { keyword, new_text } = body(payload)?;
    let result = state.service.update_text(&keyword, new_text).await?;
    Ok(send_success(Outcome::SuccessfulUpdate, result))
}

async fn edit_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, payload: Result<Json<EditTodoBody>, JsonRejection>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let EditTodoBody { text } = body(payload)?;
    let updated = state.service.edit(id, text).await?.ok_or(ApiError::NotFound(TODO_NOT_FOUND))?;
    Ok(send_success(Outcome::SuccessfulUpdate, updated))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(inner)| inner).map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

// A malformed id is a failed lookup, not a validation problem.
fn parse_id(s: &str) -> Result<TodoId, ApiError> {
    s.parse().map_err(|e| ApiError::BadRequest(anyhow::anyhow!("invalid todo id {s:?}: {e}")))
}

// Other methods on `/todos/complete` and `/todos/update-text` read the last segment as an `:id`.
async fn segment_as_id(uri: Uri) -> ApiError {
    let segment = uri.path().rsplit('/').next().unwrap_or_default();
    match parse_id(segment) {
        Err(err) => err,
        Ok(_) => ApiError::NotFound(TODO_NOT_FOUND),
    }
}
