/// Database row types. These map directly to SQLite rows.
/// Distinct from tipline-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct ReportRow {
    pub id: i64,
    pub ticket: String,
    pub title: String,
    pub category: Option<String>,
    pub body: String,
    pub code_hash: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An open report plus its thread length, for the public listing.
#[derive(Debug)]
pub struct ReportSummaryRow {
    pub id: i64,
    pub ticket: String,
    pub title: String,
    pub category: Option<String>,
    pub body: String,
    pub status: String,
    pub created_at: String,
    pub message_count: i64,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: i64,
    pub report_id: i64,
    pub body: String,
    pub author: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub created_at: String,
}

/// A post joined with its author, counters and the viewer's flags.
#[derive(Debug)]
pub struct FeedPostRow {
    pub id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: String,
    pub author: UserRow,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
    pub saved: bool,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
    pub created_at: String,
    pub author: UserRow,
}
