use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use tipline_db::is_unique_violation;
use tipline_types::api::{AuthResponse, LoginRequest, RegisterRequest};

use crate::convert;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{AppState, run_blocking};
use crate::validation;

pub async fn register(
    State(state): State<AppState>,
    req: JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reg = validation::registration(&req)?;

    let st = state.clone();
    let user = run_blocking(move || {
        // Check if email is taken
        if st.db.get_user_by_email(&reg.email)?.is_some() {
            return Err(ApiError::Conflict("Email already registered"));
        }

        // Hash password with Argon2id
        let password_hash = st.hasher.hash(&reg.password)?;

        // A concurrent registration can still win the race to the index.
        st.db
            .create_user(&reg.email, &reg.name, &password_hash)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("Email already registered")
                } else {
                    ApiError::Internal(e)
                }
            })
    })
    .await?;

    let token = state.tokens.issue(user.id)?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: convert::user(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    req: JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = validation::credentials(&req)?;

    let st = state.clone();
    let user = run_blocking(move || {
        let user = st
            .db
            .get_user_by_email(&creds.email)?
            .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

        // Verify password
        if !st.hasher.verify(&creds.password, &user.password_hash) {
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
        Ok(user)
    })
    .await?;

    let token = state.tokens.issue(user.id)?;

    Ok(Json(AuthResponse {
        token,
        user: convert::user(user),
    }))
}
