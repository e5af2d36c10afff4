//! Row -> API model conversion.

use chrono::{DateTime, Utc};
use tracing::warn;

use tipline_db::models::{CommentRow, FeedPostRow, MessageRow, ReportRow, UserRow};
use tipline_types::api::FeedPost;
use tipline_types::models::{Comment, MessageAuthor, Report, ReportMessage, ReportStatus, User};

/// Parse a stored timestamp. Rows written by the schema defaults are RFC 3339;
/// bare "YYYY-MM-DD HH:MM:SS" values are read as UTC.
pub fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

pub fn user(row: UserRow) -> User {
    User {
        id: row.id,
        email: row.email,
        name: row.name,
        avatar_url: row.avatar_url,
        verified: row.verified,
    }
}

pub fn report(row: ReportRow, messages: Vec<MessageRow>) -> Report {
    let status = row.status.parse().unwrap_or_else(|e| {
        warn!("Report {}: {}", row.ticket, e);
        ReportStatus::Open
    });

    Report {
        created_at: parse_timestamp(&row.created_at, "report"),
        updated_at: parse_timestamp(&row.updated_at, "report"),
        messages: messages.into_iter().map(message).collect(),
        ticket: row.ticket,
        title: row.title,
        category: row.category,
        body: row.body,
        status,
    }
}

fn message(row: MessageRow) -> ReportMessage {
    let author = row.author.parse().unwrap_or_else(|e| {
        warn!("Message {}: {}", row.id, e);
        MessageAuthor::User
    });

    ReportMessage {
        id: row.id,
        created_at: parse_timestamp(&row.created_at, "message"),
        body: row.body,
        author,
    }
}

pub fn feed_post(row: FeedPostRow) -> FeedPost {
    FeedPost {
        id: row.id,
        created_at: parse_timestamp(&row.created_at, "post"),
        caption: row.caption,
        image_url: row.image_url,
        author: user(row.author),
        like_count: row.like_count,
        comment_count: row.comment_count,
        liked: row.liked,
        saved: row.saved,
    }
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        created_at: parse_timestamp(&row.created_at, "comment"),
        body: row.body,
        user: user(row.author),
    }
}
