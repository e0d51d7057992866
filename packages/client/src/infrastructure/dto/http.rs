//! HTTP API response DTOs for the backend collaborator endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{HistoryEntry, User, UserId, ValueObjectError};

/// User record as returned by `/api/me` and `/api/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    pub created_at: Option<String>, // ISO 8601
}

/// `GET /api/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponseDto {
    pub user: UserDto,
}

/// `GET /api/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponseDto {
    pub users: Vec<UserDto>,
}

/// Sender block of a stored message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderDto {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// Stored message as returned by `/api/messages/{user_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessageDto {
    pub id: Option<i64>,
    pub content: String,
    pub from_user_id: Option<i64>,
    pub sender: Option<SenderDto>,
    pub created_at: Option<String>, // ISO 8601
    pub timestamp: Option<String>,  // ISO 8601
}

/// `GET /api/messages/{user_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponseDto {
    pub messages: Vec<HistoryMessageDto>,
}

/// Error body (`{"detail": "..."}` or `{"message": "..."}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBodyDto {
    pub detail: Option<serde_json::Value>,
    pub message: Option<String>,
}

impl ErrorBodyDto {
    /// Human readable detail; validation error lists are not flattened.
    pub fn describe(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            _ => self.message.clone(),
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = ValueObjectError;

    fn try_from(dto: UserDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(dto.id)?,
            username: dto.username,
            display_name: dto.display_name,
            is_online: dto.is_online,
        })
    }
}

impl From<HistoryMessageDto> for HistoryEntry {
    fn from(dto: HistoryMessageDto) -> Self {
        let from = dto
            .from_user_id
            .or_else(|| dto.sender.as_ref().and_then(|s| s.id));
        let sender_name = dto
            .sender
            .and_then(|s| s.display_name.or(s.username));
        Self {
            id: dto.id,
            from,
            sender_name,
            content: dto.content,
            sent_at: dto.timestamp.or(dto.created_at),
        }
    }
}
