use serde::{Deserialize, Serialize};

/// User roles. Registration always produces a student; role changes happen
/// out-of-band (directly in the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Alumni => "alumni",
            Self::Admin => "admin",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "alumni" => Some(Self::Alumni),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The two kinds of content that can receive votes and reports.
/// A plain two-way switch, resolved from the URL path token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Unknown tokens yield `None`; routes treat that as NotFound.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

/// Vote direction from the URL path token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Unknown tokens yield `None`; routes treat that as BadRequest.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(Self::Up),
            "downvote" => Some(Self::Down),
            _ => None,
        }
    }

    /// Signed value stored in the ledger.
    pub fn value(&self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Resulting state of a user's vote on a target after a cast action,
/// returned for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    None,
    Upvoted,
    Downvoted,
}

impl VoteState {
    pub fn from_value(value: i64) -> Self {
        match value {
            v if v > 0 => Self::Upvoted,
            v if v < 0 => Self::Downvoted,
            _ => Self::None,
        }
    }
}

/// Report lifecycle. The two `reviewed_*` values are terminal in practice,
/// but admins may overwrite status freely, including back to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    ReviewedActionTaken,
    ReviewedNoAction,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReviewedActionTaken => "reviewed_action_taken",
            Self::ReviewedNoAction => "reviewed_no_action",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "reviewed_action_taken" => Some(Self::ReviewedActionTaken),
            "reviewed_no_action" => Some(Self::ReviewedNoAction),
            _ => None,
        }
    }
}
