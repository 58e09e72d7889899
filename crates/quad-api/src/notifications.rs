use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use quad_types::api::{Claims, NotificationResponse, UnreadCountResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::posts::PageQuery;
use crate::{parse_timestamp, parse_uuid};

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let limit = query.limit.min(200);
    let offset = query.offset;

    let rows = tokio::task::spawn_blocking(move || db.db.list_notifications(&user_id, limit, offset))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("listing task failed")
        })??;

    let notifications: Vec<NotificationResponse> = rows
        .into_iter()
        .map(|row| {
            let payload = serde_json::from_str(&row.payload).unwrap_or_else(|e| {
                warn!("Corrupt payload on notification '{}': {}", row.id, e);
                serde_json::Value::Null
            });

            NotificationResponse {
                id: parse_uuid(&row.id, "notification"),
                kind: row.kind,
                payload,
                created_at: parse_timestamp(&row.created_at, "notification"),
                is_read: row.is_read,
            }
        })
        .collect();

    Ok(Json(notifications))
}

/// Recomputed with a COUNT query on every call; nothing is cached.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .db
        .unread_notification_count(&claims.sub.to_string())?;
    Ok(Json(UnreadCountResponse { count }))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .db
        .get_notification(&notification_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if notification.user_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden(
            "that notification belongs to someone else".into(),
        ));
    }

    state
        .db
        .mark_notification_read(&notification_id.to_string())?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let marked = state
        .db
        .mark_all_notifications_read(&claims.sub.to_string())?;

    Ok(Json(serde_json::json!({ "marked": marked })))
}
