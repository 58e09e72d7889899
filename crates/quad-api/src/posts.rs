use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use quad_db::models::{CommentRow, NewNotification, PostRow};
use quad_types::api::{
    Claims, CommentResponse, CreateCommentRequest, CreatePostRequest, PostDetailResponse,
    PostResponse,
};
use quad_types::notifications::NotificationPayload;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_timestamp, parse_uuid};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() || title.len() > 140 {
        return Err(ApiError::BadRequest(
            "title must be 1 to 140 characters".into(),
        ));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".into()));
    }

    let post_id = Uuid::new_v4();
    state.db.create_post(
        &post_id.to_string(),
        &claims.sub.to_string(),
        title,
        &req.content,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            id: post_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            title: title.to_string(),
            content: req.content,
            created_at: chrono::Utc::now(),
            score: 0,
            comment_count: 0,
        }),
    ))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB queries off the async runtime
    let db = state.clone();
    let limit = query.limit.min(200);
    let offset = query.offset;

    let rows = tokio::task::spawn_blocking(move || db.db.list_posts(limit, offset))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("listing task failed")
        })??;

    let posts: Vec<PostResponse> = rows.into_iter().map(post_response).collect();
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let pid = post_id.to_string();

    let (row, comment_rows) = tokio::task::spawn_blocking(move || {
        let row = db.db.get_post(&pid)?;
        let comments = db.db.list_comments(&pid)?;
        Ok::<_, anyhow::Error>((row, comments))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        anyhow::anyhow!("post lookup task failed")
    })??;

    let row = row.ok_or(ApiError::NotFound)?;

    Ok(Json(PostDetailResponse {
        post: post_response(row),
        comments: comment_rows.into_iter().map(comment_response).collect(),
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".into()));
    }

    let post = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    let comment_id = Uuid::new_v4();
    let commenter_id = claims.sub.to_string();

    // Alert the post author, unless they are commenting on their own post.
    // The notification row commits in the same transaction as the comment.
    let notification = if post.author_id != commenter_id {
        let payload = NotificationPayload::NewCommentOnPost {
            post_id,
            post_title: post.title.clone(),
            comment_id,
            commenter_id: claims.sub,
            commenter_username: claims.username.clone(),
        };
        let json = serde_json::to_string(&payload).map_err(anyhow::Error::from)?;
        Some((Uuid::new_v4().to_string(), payload.kind(), json))
    } else {
        None
    };

    state.db.create_comment(
        &comment_id.to_string(),
        &post_id.to_string(),
        &commenter_id,
        &req.content,
        notification.as_ref().map(|(id, kind, payload)| NewNotification {
            id,
            user_id: &post.author_id,
            kind,
            payload,
        }),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment_id,
            post_id,
            author_id: claims.sub,
            author_username: claims.username.clone(),
            content: req.content,
            created_at: chrono::Utc::now(),
            score: 0,
        }),
    ))
}

fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: parse_uuid(&row.id, "post"),
        author_id: parse_uuid(&row.author_id, "post author"),
        author_username: row.author_username,
        title: row.title,
        content: row.content,
        created_at: parse_timestamp(&row.created_at, "post"),
        score: row.score,
        comment_count: row.comment_count,
    }
}

fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_uuid(&row.id, "comment"),
        post_id: parse_uuid(&row.post_id, "comment post"),
        author_id: parse_uuid(&row.author_id, "comment author"),
        author_username: row.author_username,
        content: row.content,
        created_at: parse_timestamp(&row.created_at, "comment"),
        score: row.score,
    }
}
