use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{UnknownVariant, VoteValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentStatus {
    Published,
    Deleted,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Published => "Published",
            CommentStatus::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Published" => Ok(CommentStatus::Published),
            "Deleted" => Ok(CommentStatus::Deleted),
            other => Err(UnknownVariant { kind: "comment status", value: other.to_string() }),
        }
    }
}

/// Copy of the parent comment taken when the reply was written. It is never
/// refreshed, so the reply still shows what it answered after the parent changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSnapshot {
    pub id: String,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub author: String,
    pub post_id: String,
    pub parent_comment: Option<ParentSnapshot>,
    pub status: CommentStatus,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_vote: Option<VoteValue>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: String,
    pub body: String,
    pub author: String,
    pub post_id: String,
    pub parent: Option<ParentSnapshot>,
}
