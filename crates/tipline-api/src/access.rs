//! Access control for anonymous reports.
//!
//! Possession of a report's access code stands in for a login. The check runs
//! in a fixed order: look the ticket up first (unknown ticket is `NotFound`,
//! whether or not a code was sent), then verify the code against the stored
//! Argon2 hash (missing or wrong code is `Forbidden`). There is no attempt
//! limit; Argon2's cost is the only brake on guessing.

use axum::http::HeaderMap;
use tracing::debug;

use tipline_crypto::CodeHasher;
use tipline_db::Database;
use tipline_db::models::ReportRow;

use crate::error::ApiError;

/// Header carrying the access code when it is not in the query string.
pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// The code presented with a request: the `code` query parameter, then the
/// `X-Access-Code` header. First non-empty wins.
pub fn presented_code(query: Option<&str>, headers: &HeaderMap) -> Option<String> {
    query
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(ACCESS_CODE_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        })
}

/// Resolve `ticket` and check `code` against it. Blocking: call from
/// [`crate::state::run_blocking`].
pub fn authorize(
    db: &Database,
    hasher: &CodeHasher,
    ticket: &str,
    code: Option<&str>,
) -> Result<ReportRow, ApiError> {
    let report = db.get_report_by_ticket(ticket)?.ok_or(ApiError::NotFound)?;

    match code {
        Some(code) if !code.is_empty() && hasher.verify(code, &report.code_hash) => Ok(report),
        _ => {
            debug!("Access denied for report {}", report.ticket);
            Err(ApiError::Forbidden)
        }
    }
}
