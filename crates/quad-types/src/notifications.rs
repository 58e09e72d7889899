use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payloads appended to a user's notification inbox. Stored as JSON in the
/// `payload` column; the `kind` tag is duplicated into its own column so the
/// inbox can be filtered without parsing payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Someone commented on one of your posts.
    NewCommentOnPost {
        post_id: Uuid,
        post_title: String,
        comment_id: Uuid,
        commenter_id: Uuid,
        commenter_username: String,
    },

    /// Someone started following you.
    NewFollower {
        follower_id: Uuid,
        follower_username: String,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewCommentOnPost { .. } => "new_comment_on_post",
            Self::NewFollower { .. } => "new_follower",
        }
    }
}
