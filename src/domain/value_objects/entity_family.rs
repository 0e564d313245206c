use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain type of a cached record. Each family has its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFamily {
    Message,
    Post,
    Story,
    Comment,
    FollowEdge,
}

impl EntityFamily {
    pub const ALL: [EntityFamily; 5] = [
        EntityFamily::Message,
        EntityFamily::Post,
        EntityFamily::Story,
        EntityFamily::Comment,
        EntityFamily::FollowEdge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityFamily::Message => "message",
            EntityFamily::Post => "post",
            EntityFamily::Story => "story",
            EntityFamily::Comment => "comment",
            EntityFamily::FollowEdge => "follow_edge",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.as_str() == value)
            .ok_or_else(|| format!("Unknown entity family: {value}"))
    }

    /// Backing table. Only these literals are ever interpolated into SQL.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityFamily::Message => "messages",
            EntityFamily::Post => "posts",
            EntityFamily::Story => "stories",
            EntityFamily::Comment => "comments",
            EntityFamily::FollowEdge => "follow_edges",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
