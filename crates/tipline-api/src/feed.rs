use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use tipline_types::api::{
    AddCommentRequest, AddCommentResponse, CreatePostRequest, CreatePostResponse, FeedResponse,
    ToggleLikeResponse, ToggleSaveResponse,
};

use crate::convert;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::middleware::{CurrentUser, session_user};
use crate::state::{AppState, run_blocking};
use crate::validation;

const FEED_LIMIT: u32 = 20;

/// GET /feed: newest posts. Works anonymously; with a valid token the
/// `liked`/`saved` flags reflect the caller.
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = session_user(&state, &headers).await?;

    let st = state.clone();
    let rows = run_blocking(move || Ok(st.db.get_feed(viewer, FEED_LIMIT)?)).await?;

    Ok(Json(FeedResponse {
        posts: rows.into_iter().map(convert::feed_post).collect(),
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    req: JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = validation::new_post(&req)?;

    let st = state.clone();
    let id = run_blocking(move || {
        Ok(st
            .db
            .create_post(user.id, &post.image_url, post.caption.as_deref())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(CreatePostResponse { id })))
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let (liked, like_count) = run_blocking(move || {
        ensure_post(&st, post_id)?;
        Ok(st.db.toggle_like(post_id, user.id)?)
    })
    .await?;

    Ok(Json(ToggleLikeResponse { liked, like_count }))
}

pub async fn save_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let saved = run_blocking(move || {
        ensure_post(&st, post_id)?;
        Ok(st.db.toggle_save(post_id, user.id)?)
    })
    .await?;

    Ok(Json(ToggleSaveResponse { saved }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
    req: JsonBody<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = validation::comment_body(&req)?;

    let st = state.clone();
    let (comment, comment_count) = run_blocking(move || {
        ensure_post(&st, post_id)?;
        Ok(st.db.add_comment(post_id, user.id, &body)?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddCommentResponse {
            comment: convert::comment(comment),
            comment_count,
        }),
    ))
}

fn ensure_post(state: &AppState, post_id: i64) -> Result<(), ApiError> {
    if state.db.post_exists(post_id)? {
        Ok(())
    } else {
        Err(ApiError::NotFound)
    }
}
