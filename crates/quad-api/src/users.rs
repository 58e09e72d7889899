use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use quad_db::models::NewNotification;
use quad_types::api::{Claims, ProfileResponse};
use quad_types::models::Role;
use quad_types::notifications::NotificationPayload;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_timestamp, parse_uuid};

pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_username(&username)?
        .ok_or(ApiError::NotFound)?;

    let stats = state.db.profile_stats(&user.id)?;

    let role = Role::from_token(&user.role).unwrap_or_else(|| {
        warn!("Unknown role '{}' on user '{}'", user.role, user.id);
        Role::Student
    });

    Ok(Json(ProfileResponse {
        user_id: parse_uuid(&user.id, "user"),
        username: user.username,
        role,
        created_at: parse_timestamp(&user.created_at, "user"),
        followers: stats.followers,
        following: stats.following,
        posts: stats.posts,
    }))
}

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let followed = state
        .db
        .get_user_by_username(&username)?
        .ok_or(ApiError::NotFound)?;

    let follower_id = claims.sub.to_string();
    if followed.id == follower_id {
        return Err(ApiError::BadRequest("you cannot follow yourself".into()));
    }

    let payload = NotificationPayload::NewFollower {
        follower_id: claims.sub,
        follower_username: claims.username.clone(),
    };
    let json = serde_json::to_string(&payload).map_err(anyhow::Error::from)?;
    let notification_id = Uuid::new_v4().to_string();

    // Refollowing is a no-op; the notification only lands on a new edge.
    state.db.follow_user(
        &follower_id,
        &followed.id,
        Some(NewNotification {
            id: &notification_id,
            user_id: &followed.id,
            kind: payload.kind(),
            payload: &json,
        }),
    )?;

    Ok(Json(serde_json::json!({ "following": true })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let followed = state
        .db
        .get_user_by_username(&username)?
        .ok_or(ApiError::NotFound)?;

    state
        .db
        .unfollow_user(&claims.sub.to_string(), &followed.id)?;

    Ok(Json(serde_json::json!({ "following": false })))
}
