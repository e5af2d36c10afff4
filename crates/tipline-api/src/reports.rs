use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use tipline_crypto::secret::{ACCESS_CODE_LEN, TICKET_LEN, generate_access_code, generate_ticket};
use tipline_db::{Database, is_unique_violation};
use tipline_types::api::{
    AccessCodeQuery, CreateReportRequest, CreateReportResponse, PostMessageRequest,
    PostMessageResponse, PublicAuthor, PublicReport, PublicReportsResponse,
};
use tipline_types::models::MessageAuthor;

use crate::access::{authorize, presented_code};
use crate::convert::{self, parse_timestamp};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{AppState, run_blocking};
use crate::validation::{self, NewReport};

const PUBLIC_LIMIT: u32 = 20;
const PREVIEW_CHARS: usize = 200;

/// POST /reports: file a report. The access code in the response is shown
/// exactly once; only its hash is stored.
pub async fn create_report(
    State(state): State<AppState>,
    req: JsonBody<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = validation::new_report(&req)?;

    let st = state.clone();
    let created = run_blocking(move || {
        let code = generate_access_code(ACCESS_CODE_LEN);
        let code_hash = st.hasher.hash(&code)?;
        let ticket = insert_report(&st.db, &report, &code_hash, || generate_ticket(TICKET_LEN))?;
        Ok(CreateReportResponse {
            ticket,
            access_code: code,
        })
    })
    .await?;

    info!("Report {} created", created.ticket);
    Ok((StatusCode::CREATED, Json(created)))
}

/// Stores the report under a fresh ticket. A ticket collision is retried once
/// with the next ticket; a second collision is a system fault.
fn insert_report(
    db: &Database,
    report: &NewReport,
    code_hash: &str,
    mut next_ticket: impl FnMut() -> String,
) -> Result<String, ApiError> {
    let mut retried = false;
    loop {
        let ticket = next_ticket();
        match db.insert_report(
            &ticket,
            &report.title,
            report.category.as_deref(),
            &report.body,
            code_hash,
        ) {
            Ok(_) => return Ok(ticket),
            Err(e) if is_unique_violation(&e) && !retried => {
                warn!("Ticket collision on {}, retrying", ticket);
                retried = true;
            }
            Err(e) => return Err(ApiError::Internal(e.context("creating report"))),
        }
    }
}

/// GET /reports/{ticket}: the full report and thread, for the code holder.
pub async fn get_report(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    Query(query): Query<AccessCodeQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let code = presented_code(query.code.as_deref(), &headers);

    let st = state.clone();
    let (row, messages) = run_blocking(move || {
        let row = authorize(&st.db, &st.hasher, &ticket, code.as_deref())?;
        let messages = st.db.get_messages(row.id)?;
        Ok((row, messages))
    })
    .await?;

    Ok(Json(convert::report(row, messages)))
}

/// POST /reports/{ticket}/messages: append one reporter message.
///
/// The body is validated only after the access check, so an unauthorised
/// caller learns nothing from body errors.
pub async fn post_message(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    Query(query): Query<AccessCodeQuery>,
    headers: HeaderMap,
    req: JsonBody<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = presented_code(query.code.as_deref(), &headers);

    let st = state.clone();
    let id = run_blocking(move || {
        let row = authorize(&st.db, &st.hasher, &ticket, code.as_deref())?;
        let text = validation::message_body(&req)?;

        Ok(st.db.insert_message(row.id, &text, MessageAuthor::User.as_str())?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostMessageResponse {
            message: "Message posted".to_string(),
            id,
        }),
    ))
}

/// GET /reports/public: newest open reports, shaped like feed items.
pub async fn public_reports(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let rows = run_blocking(move || Ok(st.db.list_open_reports(PUBLIC_LIMIT)?)).await?;

    let reports = rows
        .into_iter()
        .map(|r| PublicReport {
            id: format!("report_{}", r.id),
            kind: "report".to_string(),
            created_at: parse_timestamp(&r.created_at, "report"),
            body: preview(&r.body),
            ticket: r.ticket,
            title: r.title,
            category: r.category,
            author: PublicAuthor {
                id: None,
                email: None,
                name: "Anonymous Whistleblower".to_string(),
                avatar_url: None,
                verified: true,
            },
            like_count: 0,
            comment_count: r.message_count,
            liked: false,
            saved: false,
            status: r.status,
        })
        .collect();

    Ok(Json(PublicReportsResponse { reports }))
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
