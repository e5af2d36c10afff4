use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message on a report thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    User,
    Staff,
}

impl MessageAuthor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Staff => "staff",
        }
    }
}

impl FromStr for MessageAuthor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "staff" => Ok(Self::Staff),
            other => Err(format!("unknown message author '{other}'")),
        }
    }
}

/// Report lifecycle. Only `open` is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            other => Err(format!("unknown report status '{other}'")),
        }
    }
}

/// Public view of a registered user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMessage {
    pub id: i64,
    pub body: String,
    pub author: MessageAuthor,
    pub created_at: DateTime<Utc>,
}

/// Full report as returned to the holder of its access code.
/// The code hash is intentionally absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub ticket: String,
    pub title: String,
    pub category: Option<String>,
    pub body: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ReportMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: User,
}
