//! User directory endpoints.
//!
//! Admin-only operations name the acting user with a `username` (query
//! string for reads and deletes, body for role changes).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stockroom_core::{Role, User, ValidationError};
use stockroom_db::NewUser;

use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/stores", get(list_stores))
        .route("/stores/{store}/users", get(users_by_store))
        .route("/users", get(list_users))
        .route("/users/{user_id}", delete(delete_user))
        .route("/users/{user_id}/type", put(update_user_type))
        .route("/users/{user_id}/password", put(change_password))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTypeBody {
    pub user_type: String,
    /// The acting admin.
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequesterQuery {
    #[serde(default)]
    pub username: String,
}

async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let role = body.user_type.as_deref().map(str::parse::<Role>).transpose()?;
    let store = body
        .store
        .filter(|s| !s.trim().is_empty())
        .or_else(|| state.default_store().map(str::to_string))
        .ok_or_else(|| ValidationError::Required {
            field: "store".to_string(),
        })?;

    let user = state
        .db
        .users()
        .register(NewUser {
            username: body.username,
            password: body.password,
            role,
            store,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(state): State<AppState>, AppJson(body): AppJson<LoginBody>) -> ApiResult<Json<User>> {
    Ok(Json(state.db.users().login(&body.username, &body.password).await?))
}

async fn list_stores(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.users().stores().await?))
}

async fn users_by_store(State(state): State<AppState>, Path(store): Path<String>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().by_store(&store).await?))
}

async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RequesterQuery>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list(&query.username).await?))
}

async fn update_user_type(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(body): AppJson<UpdateTypeBody>,
) -> ApiResult<Json<User>> {
    let role: Role = body.user_type.parse()?;
    Ok(Json(state.db.users().update_role(&body.username, &user_id, role).await?))
}

async fn change_password(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(body): AppJson<ChangePasswordBody>,
) -> ApiResult<Json<Value>> {
    state
        .db
        .users()
        .change_password(&user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppQuery(query): AppQuery<RequesterQuery>,
) -> ApiResult<Json<Value>> {
    state.db.users().delete(&query.username, &user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
