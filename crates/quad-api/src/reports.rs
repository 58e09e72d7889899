use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use quad_db::models::ReportRow;
use quad_types::api::{
    Claims, FileReportRequest, PendingCountResponse, ReportResponse, UpdateReportStatusRequest,
};
use quad_types::models::{ReportStatus, TargetKind};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::ensure_admin;
use crate::posts::PageQuery;
use crate::{parse_timestamp, parse_uuid, target_ref};

pub async fn file_report(
    State(state): State<AppState>,
    Path((kind, target_id)): Path<(String, Uuid)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FileReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = TargetKind::from_token(&kind).ok_or(ApiError::NotFound)?;

    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest("a reason is required".into()));
    }

    let tid = target_id.to_string();
    let target = target_ref(kind, &tid);

    let author = state.db.target_author(target)?.ok_or(ApiError::NotFound)?;
    if author == claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "you cannot report your own content".into(),
        ));
    }

    let report_id = Uuid::new_v4();
    let filed = state
        .db
        .file_report(&report_id.to_string(), &claims.sub.to_string(), target, reason)?;

    if !filed {
        return Err(ApiError::Conflict(
            "you have already reported this content".into(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "report_id": report_id })),
    ))
}

/// Pending reports, oldest first, for FIFO triage.
pub async fn list_pending(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&state, &claims)?;

    let db = state.clone();
    let limit = query.limit.min(200);
    let offset = query.offset;

    let rows = tokio::task::spawn_blocking(move || db.db.list_pending_reports(limit, offset))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("listing task failed")
        })??;

    let reports: Vec<ReportResponse> = rows.into_iter().filter_map(report_response).collect();
    Ok(Json(reports))
}

pub async fn view_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&state, &claims)?;

    let row = state
        .db
        .get_report(&report_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let response = report_response(row).ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("report {} has no target", report_id))
    })?;

    Ok(Json(response))
}

pub async fn pending_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&state, &claims)?;

    let count = state.db.pending_report_count()?;
    Ok(Json(PendingCountResponse { count }))
}

/// Overwrites status and notes; admins may set any recognized status,
/// including moving a reviewed report back to pending.
pub async fn update_status(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateReportStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&state, &claims)?;

    let updated = state.db.update_report_status(
        &report_id.to_string(),
        req.status.as_str(),
        req.admin_notes.as_deref(),
    )?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    let row = state
        .db
        .get_report(&report_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let response = report_response(row).ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("report {} has no target after update", report_id))
    })?;

    Ok(Json(response))
}

fn report_response(row: ReportRow) -> Option<ReportResponse> {
    let (target_kind, target_id) = match (&row.post_id, &row.comment_id) {
        (Some(id), None) => (TargetKind::Post, id.clone()),
        (None, Some(id)) => (TargetKind::Comment, id.clone()),
        _ => {
            warn!("Report '{}' has no target", row.id);
            return None;
        }
    };

    let status = ReportStatus::from_token(&row.status).unwrap_or_else(|| {
        warn!("Unknown status '{}' on report '{}'", row.status, row.id);
        ReportStatus::Pending
    });

    Some(ReportResponse {
        id: parse_uuid(&row.id, "report"),
        reporter_id: parse_uuid(&row.reporter_id, "report reporter"),
        reporter_username: row.reporter_username,
        target_kind,
        target_id: parse_uuid(&target_id, "report target"),
        reason: row.reason,
        status,
        admin_notes: row.admin_notes,
        created_at: parse_timestamp(&row.created_at, "report"),
    })
}
