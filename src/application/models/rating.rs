use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Clone)]
pub struct RatingContent {
    pub comment: String,
}

/// Payload for rating a recommendation. Each request carries a fresh
/// rating id; the token comes from the feed batch the subject arrived in.
#[derive(Debug, Serialize, Clone)]
pub struct RatingRequest {
    #[serde(rename = "ratingId")]
    pub rating_id: String,

    #[serde(rename = "ratingToken")]
    pub rating_token: String,

    #[serde(rename = "subjectId")]
    pub subject_id: String,

    #[serde(rename = "sessionId")]
    pub session_id: String,

    pub rating: String,

    pub origin: String,

    #[serde(rename = "hasPairing")]
    pub has_pairing: bool,

    pub created: String,

    #[serde(rename = "initiatedWith")]
    pub initiated_with: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<RatingContent>,
}

impl RatingRequest {
    pub fn like(
        subject_id: &str,
        rating_token: &str,
        session_id: &str,
        comment: Option<&str>,
    ) -> Self {
        Self {
            rating_id: Uuid::new_v4().to_string(),
            rating_token: rating_token.to_string(),
            subject_id: subject_id.to_string(),
            session_id: session_id.to_string(),
            rating: "note".to_string(),
            origin: "compatibles".to_string(),
            has_pairing: false,
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            initiated_with: "standard".to_string(),
            content: comment.map(|c| RatingContent {
                comment: c.to_string(),
            }),
        }
    }
}

impl fmt::Display for RatingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct MessageData {
    pub message: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct MessageRequest {
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    #[serde(rename = "matchMessage")]
    pub match_message: bool,

    pub origin: String,

    #[serde(rename = "dedupId")]
    pub dedup_id: String,

    #[serde(rename = "messageData")]
    pub message_data: MessageData,

    #[serde(rename = "messageType")]
    pub message_type: String,

    pub ays: bool,
}

impl MessageRequest {
    pub fn new(subject_id: &str, message: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            match_message: false,
            origin: "Native Chat".to_string(),
            dedup_id: Uuid::new_v4().to_string(),
            message_data: MessageData {
                message: message.to_string(),
            },
            message_type: "message".to_string(),
            ays: true,
        }
    }
}

impl fmt::Display for MessageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}
