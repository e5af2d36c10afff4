use serde::{Deserialize, Serialize};

use crate::models::{Comment, User};

// Request bodies keep every field optional so that missing fields come back
// as field-level validation errors instead of extractor rejections.

// -- Reports --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateReportRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub body: Option<String>,
}

/// Returned exactly once. The access code cannot be recovered afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReportResponse {
    pub ticket: String,
    pub access_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostMessageRequest {
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostMessageResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessCodeQuery {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicAuthor {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub name: String,
    pub avatar_url: Option<String>,
    pub verified: bool,
}

/// Feed-shaped summary of an open report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicReport {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ticket: String,
    pub title: String,
    pub category: Option<String>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author: PublicAuthor,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
    pub saved: bool,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicReportsResponse {
    pub reports: Vec<PublicReport>,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Feed --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub image_url: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: i64,
    pub caption: Option<String>,
    pub image_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author: User,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
    pub saved: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedPost>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleSaveResponse {
    pub saved: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddCommentRequest {
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCommentResponse {
    pub comment: Comment,
    pub comment_count: i64,
}
