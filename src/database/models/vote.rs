use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteValue {
    Like,
    Dislike,
}

impl VoteValue {
    pub const ALL: [&'static str; 2] = ["Like", "Dislike"];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteValue::Like => "Like",
            VoteValue::Dislike => "Dislike",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteValue {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Like" => Ok(VoteValue::Like),
            "Dislike" => Ok(VoteValue::Dislike),
            other => Err(UnknownVariant { kind: "vote", value: other.to_string() }),
        }
    }
}

/// The thing being voted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(String),
    Comment(String),
}

impl VoteTarget {
    pub fn id(&self) -> &str {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => id,
        }
    }
}

/// One viewer's vote. At most one exists per (viewer, target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub viewer: String,
    pub target: VoteTarget,
    pub value: VoteValue,
}
