use crate::error::Error;
use crate::handlers::AppState;
use crate::models::{DeleteResult, InsertResult, UpdateResult, User, UserResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};

/// Register a new user. The body is the user document with the plaintext
/// password in `hash`.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<(StatusCode, Json<InsertResult>), Error> {
    tracing::info!("Adding new user");
    let Json(user) = payload.map_err(|e| Error::validation(e.body_text()))?;

    let result = state.accounts.register(user).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Gets a user by email.
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if email.trim().is_empty() {
        return Err(Error::validation(
            "email must be included in the search parameters",
        ));
    }

    let user = state.accounts.fetch_by_email(&email).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Path((email, status)): Path<(String, String)>,
) -> Result<(StatusCode, Json<UpdateResult>), Error> {
    if email.trim().is_empty() || status.trim().is_empty() {
        return Err(Error::validation(
            "email or status is not present in the url",
        ));
    }

    let result = state.accounts.update_status(&email, &status).await?;
    Ok((StatusCode::OK, Json(result)))
}

/// Delete a user after checking the password in the path.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path((email, password)): Path<(String, String)>,
) -> Result<(StatusCode, Json<DeleteResult>), Error> {
    tracing::info!("Attempting to delete user from db.");
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("Email or password is missing."));
    }

    let result = state.accounts.close(&email, &password).await?;
    Ok((StatusCode::OK, Json(result)))
}

#[axum::debug_handler]
pub async fn authenticate(
    State(state): State<AppState>,
    Path((email, password)): Path<(String, String)>,
) -> Result<(StatusCode, Json<String>), Error> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("Email or password is missing."));
    }

    state.accounts.authenticate(&email, &password).await?;
    Ok((
        StatusCode::OK,
        Json("User has been authenticated successfully.".to_string()),
    ))
}

/// Email confirmation is not implemented; always answers 200 with no body.
#[axum::debug_handler(state = AppState)]
pub async fn confirm_email(Path(email): Path<String>) -> StatusCode {
    tracing::debug!(%email, "Email confirmation requested");
    StatusCode::OK
}
