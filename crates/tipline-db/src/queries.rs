use crate::Database;
use crate::models::{
    CommentRow, FeedPostRow, MessageRow, ReportRow, ReportSummaryRow, UserRow,
};
use anyhow::Result;
use rusqlite::{Connection, Row};

const REPORT_COLUMNS: &str =
    "id, ticket, title, category, body, code_hash, status, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, email, name, password_hash, avatar_url, verified, created_at";

impl Database {
    // -- Reports --

    /// Insert a report. A duplicate ticket fails with a UNIQUE violation
    /// (see [`crate::is_unique_violation`]); nothing is overwritten.
    pub fn insert_report(
        &self,
        ticket: &str,
        title: &str,
        category: Option<&str>,
        body: &str,
        code_hash: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports (ticket, title, category, body, code_hash) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![ticket, title, category, body, code_hash],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_report_by_ticket(&self, ticket: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE ticket = ?1"),
                [ticket],
                report_from_row,
            )
            .optional()
        })
    }

    /// Newest open reports with their message counts.
    pub fn list_open_reports(&self, limit: u32) -> Result<Vec<ReportSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.ticket, r.title, r.category, r.body, r.status, r.created_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.report_id = r.id)
                 FROM reports r
                 WHERE r.status = 'open'
                 ORDER BY r.created_at DESC, r.id DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(ReportSummaryRow {
                        id: row.get(0)?,
                        ticket: row.get(1)?,
                        title: row.get(2)?,
                        category: row.get(3)?,
                        body: row.get(4)?,
                        status: row.get(5)?,
                        created_at: row.get(6)?,
                        message_count: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete a report and its thread in one transaction.
    /// Returns false if no report had that ticket.
    pub fn delete_report(&self, ticket: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let report_id: Option<i64> = tx
                .query_row("SELECT id FROM reports WHERE ticket = ?1", [ticket], |row| {
                    row.get(0)
                })
                .optional()?;

            let Some(report_id) = report_id else {
                return Ok(false);
            };

            tx.execute("DELETE FROM messages WHERE report_id = ?1", [report_id])?;
            tx.execute("DELETE FROM reports WHERE id = ?1", [report_id])?;
            tx.commit()?;
            Ok(true)
        })
    }

    // -- Messages --

    /// Append a message to a report's thread. Returns the new message id.
    pub fn insert_message(&self, report_id: i64, body: &str, author: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (report_id, body, author) VALUES (?1, ?2, ?3)",
                rusqlite::params![report_id, body, author],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Thread in creation order.
    pub fn get_messages(&self, report_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, report_id))
    }

    // -- Users --

    pub fn create_user(&self, email: &str, name: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, name, password_hash) VALUES (?1, ?2, ?3)",
                (email, name, password_hash),
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id", id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Posts --

    pub fn create_post(&self, user_id: i64, image_url: &str, caption: Option<&str>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, image_url, caption) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, image_url, caption],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn post_exists(&self, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
                [post_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Newest posts with counters. `liked`/`saved` are relative to `viewer`
    /// and always false for anonymous callers.
    pub fn get_feed(&self, viewer: Option<i64>, limit: u32) -> Result<Vec<FeedPostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.image_url, p.caption, p.created_at,
                        u.id, u.email, u.name, u.password_hash, u.avatar_url, u.verified, u.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
                        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id),
                        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1),
                        EXISTS(SELECT 1 FROM saves s WHERE s.post_id = p.id AND s.user_id = ?1)
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![viewer, limit], |row| {
                    Ok(FeedPostRow {
                        id: row.get(0)?,
                        image_url: row.get(1)?,
                        caption: row.get(2)?,
                        created_at: row.get(3)?,
                        author: user_from_row_at(row, 4)?,
                        like_count: row.get(11)?,
                        comment_count: row.get(12)?,
                        liked: row.get(13)?,
                        saved: row.get(14)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Likes / saves --

    /// Toggle a like: removes if present, inserts if not.
    /// Returns (liked, like_count) after the change.
    pub fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<(bool, i64)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let liked = toggle_pair(&tx, "likes", post_id, user_id)?;
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
                [post_id],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok((liked, count))
        })
    }

    /// Toggle a save. Returns whether the post is now saved.
    pub fn toggle_save(&self, post_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let saved = toggle_pair(&tx, "saves", post_id, user_id)?;
            tx.commit()?;
            Ok(saved)
        })
    }

    // -- Comments --

    /// Add a comment. Returns the stored comment and the post's new total.
    pub fn add_comment(&self, post_id: i64, user_id: i64, body: &str) -> Result<(CommentRow, i64)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO comments (post_id, user_id, body) VALUES (?1, ?2, ?3)",
                rusqlite::params![post_id, user_id, body],
            )?;
            let id = tx.last_insert_rowid();

            let comment = tx.query_row(
                "SELECT c.id, c.post_id, c.body, c.created_at,
                        u.id, u.email, u.name, u.password_hash, u.avatar_url, u.verified, u.created_at
                 FROM comments c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.id = ?1",
                [id],
                |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        body: row.get(2)?,
                        created_at: row.get(3)?,
                        author: user_from_row_at(row, 4)?,
                    })
                },
            )?;
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
                [post_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok((comment, count))
        })
    }
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        ticket: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        body: row.get(4)?,
        code_hash: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Read the seven user columns starting at `offset`.
fn user_from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(offset)?,
        email: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        password_hash: row.get(offset + 3)?,
        avatar_url: row.get(offset + 4)?,
        verified: row.get(offset + 5)?,
        created_at: row.get(offset + 6)?,
    })
}

fn query_user<V: rusqlite::ToSql>(conn: &Connection, column: &str, value: V) -> Result<Option<UserRow>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
        [value],
        |row| user_from_row_at(row, 0),
    )
    .optional()
}

fn query_messages(conn: &Connection, report_id: i64) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, body, author, created_at
         FROM messages
         WHERE report_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([report_id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                report_id: row.get(1)?,
                body: row.get(2)?,
                author: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Shared toggle for the (post, user) tables. `table` is a fixed identifier.
fn toggle_pair(conn: &Connection, table: &str, post_id: i64, user_id: i64) -> Result<bool> {
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE post_id = ?1 AND user_id = ?2"),
            [post_id, user_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(existing_id) = existing {
        conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [existing_id])?;
        Ok(false)
    } else {
        conn.execute(
            &format!("INSERT INTO {table} (post_id, user_id) VALUES (?1, ?2)"),
            [post_id, user_id],
        )?;
        Ok(true)
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
