use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{UnknownVariant, VoteValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Draft,
    Published,
    Deleted,
}

impl PostStatus {
    pub const ALL: [&'static str; 3] = ["Draft", "Published", "Deleted"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Published => "Published",
            PostStatus::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(PostStatus::Draft),
            "Published" => Ok(PostStatus::Published),
            "Deleted" => Ok(PostStatus::Deleted),
            other => Err(UnknownVariant { kind: "post status", value: other.to_string() }),
        }
    }
}

/// Read model: a post row joined with its tags, vote tallies and the viewer's own vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author: String,
    pub status: PostStatus,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_vote: Option<VoteValue>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author: String,
    pub status: PostStatus,
}

/// Replacement content for an existing post. Tags replace the stored set wholesale.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}
