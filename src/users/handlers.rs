use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::UserError,
    state::AppState,
    users::{
        dto::{DeletedResponse, UpdateUserRequest},
        repo_types::User,
        validation::validate_create_body,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        // GET takes a username, PATCH and DELETE take a user id.
        .route(
            "/users/:key",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, UserError> {
    Ok(Json(state.users.find_all().await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, UserError> {
    Ok(Json(state.users.find_one_by_username(&username).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<User>), UserError> {
    let req = validate_create_body(&payload)?;
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Vec<User>>, UserError> {
    Ok(Json(state.users.update_user(id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, UserError> {
    let deleted = state.users.delete_user(id).await?;
    Ok(Json(DeletedResponse { deleted }))
}
