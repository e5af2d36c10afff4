use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let (scheme, token) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

/// Resolve the caller from the bearer token. `None` for a missing, invalid or
/// expired token, or one naming a user that no longer exists.
pub async fn session_user(state: &AppState, headers: &HeaderMap) -> Result<Option<i64>, ApiError> {
    let Some(claims) = bearer_token(headers)
        .and_then(|token| state.tokens.verify(token, state.token_max_age))
    else {
        return Ok(None);
    };

    let st = state.clone();
    let user = run_blocking(move || Ok(st.db.get_user_by_id(claims.uid)?)).await?;
    Ok(user.map(|u| u.id))
}

/// Reject the request unless it carries a valid session token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = session_user(&state, req.headers())
        .await?
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;

    req.extensions_mut().insert(CurrentUser { id });
    Ok(next.run(req).await)
}
