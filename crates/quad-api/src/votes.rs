use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use quad_types::api::{Claims, VoteResponse};
use quad_types::models::{TargetKind, VoteDirection, VoteState};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::target_ref;

/// Tri-state vote toggle on a post or comment. Casting the same direction
/// twice removes the vote; casting the opposite direction switches it.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path((kind, target_id, action)): Path<(String, Uuid, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<VoteResponse>, ApiError> {
    let kind = TargetKind::from_token(&kind).ok_or(ApiError::NotFound)?;
    let direction = VoteDirection::from_token(&action)
        .ok_or_else(|| ApiError::BadRequest(format!("unrecognized vote action '{}'", action)))?;

    let tid = target_id.to_string();
    let target = target_ref(kind, &tid);

    if state.db.target_author(target)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let (value, score) = state.db.cast_vote(
        &Uuid::new_v4().to_string(),
        &claims.sub.to_string(),
        target,
        direction.value(),
    )?;

    Ok(Json(VoteResponse {
        state: VoteState::from_value(value),
        score,
    }))
}
