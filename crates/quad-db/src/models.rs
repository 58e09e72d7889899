/// Database row types — these map directly to SQLite rows.
/// Distinct from quad-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub score: i64,
    pub comment_count: i64,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
    pub score: i64,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
    pub is_read: bool,
}

pub struct ReportRow {
    pub id: String,
    pub reporter_id: String,
    pub reporter_username: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub reason: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: String,
}

pub struct ProfileStats {
    pub followers: i64,
    pub following: i64,
    pub posts: i64,
}

/// A notification to append. Insertion happens inside whatever transaction
/// the caller is running, so the notification commits atomically with the
/// action that triggered it.
pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub kind: &'a str,
    pub payload: &'a str,
}

/// Resolves a vote/report target to the row it references. Votes and reports
/// store the id in one of two foreign-key columns; this picks which.
#[derive(Debug, Clone, Copy)]
pub enum TargetRef<'a> {
    Post(&'a str),
    Comment(&'a str),
}

impl<'a> TargetRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Self::Post(id) | Self::Comment(id) => id,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Post(_) => "post_id",
            Self::Comment(_) => "comment_id",
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Post(_) => "posts",
            Self::Comment(_) => "comments",
        }
    }
}
