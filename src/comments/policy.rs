// src/comments/policy.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::tree::CommentForest;

/// Fate of the replies when a comment is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// The whole reply subtree is deleted with its parent.
    #[default]
    Cascade,
    /// Direct replies become root comments.
    PromoteToRoot,
    /// Deleting a comment that still has replies is refused.
    ForbidIfReplies,
}

impl DeletePolicy {
    /// Mirrors a confirmed server-side delete in a local forest.
    pub fn apply(self, forest: &mut CommentForest, comment_id: i64) -> usize {
        match self {
            DeletePolicy::Cascade | DeletePolicy::ForbidIfReplies => forest.remove(comment_id),
            DeletePolicy::PromoteToRoot => forest.remove_promoting(comment_id),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeletePolicy::Cascade => "cascade",
            DeletePolicy::PromoteToRoot => "promote",
            DeletePolicy::ForbidIfReplies => "forbid",
        })
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" | "cascade-delete" => Ok(DeletePolicy::Cascade),
            "promote" | "promote-to-root" => Ok(DeletePolicy::PromoteToRoot),
            "forbid" | "forbid-if-has-children" => Ok(DeletePolicy::ForbidIfReplies),
            other => Err(format!(
                "unknown delete policy '{}' (expected cascade, promote or forbid)",
                other
            )),
        }
    }
}
