use super::EntityFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation recorded in the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    UploadPost,
    UploadStory,
    FollowRequest,
    LikeToggle,
    AddComment,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::SendMessage,
        ActionType::UploadPost,
        ActionType::UploadStory,
        ActionType::FollowRequest,
        ActionType::LikeToggle,
        ActionType::AddComment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendMessage => "send_message",
            ActionType::UploadPost => "upload_post",
            ActionType::UploadStory => "upload_story",
            ActionType::FollowRequest => "follow_request",
            ActionType::LikeToggle => "like_toggle",
            ActionType::AddComment => "add_comment",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("Unknown action type: {value}"))
    }

    /// Entity family whose table the action's record lives in.
    pub fn family(&self) -> EntityFamily {
        match self {
            ActionType::SendMessage => EntityFamily::Message,
            ActionType::UploadPost | ActionType::LikeToggle => EntityFamily::Post,
            ActionType::UploadStory => EntityFamily::Story,
            ActionType::FollowRequest => EntityFamily::FollowEdge,
            ActionType::AddComment => EntityFamily::Comment,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
