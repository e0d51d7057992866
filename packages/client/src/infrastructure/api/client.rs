//! `reqwest` implementation of [`ChatDirectory`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;

use crate::{
    domain::{ChatDirectory, CredentialSource, DirectoryError, HistoryEntry, User, UserId},
    infrastructure::{
        credential::ACCESS_TOKEN_COOKIE,
        dto::http::{ErrorBodyDto, MeResponseDto, MessagesResponseDto, UsersResponseDto},
    },
};

/// Client for `/api/me`, `/api/users` and `/api/messages/{user_id}`.
///
/// Every request carries the `access_token` cookie when the credential source
/// has one.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
}

impl ApiClient {
    /// Create a client for the given HTTP origin (e.g. `http://localhost:8000`).
    pub fn new(origin: &str, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            base_url: origin.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            credentials,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.get(&url);
        if let Some(credential) = self.credentials.read() {
            request = request.header(
                COOKIE,
                format!("{ACCESS_TOKEN_COOKIE}={}", credential.as_str()),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBodyDto>().await.unwrap_or_default();
            let detail = body
                .describe()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            tracing::debug!(%url, status = status.as_u16(), %detail, "API request failed");
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ChatDirectory for ApiClient {
    async fn me(&self) -> Result<User, DirectoryError> {
        let body: MeResponseDto = self.get_json("/api/me").await?;
        User::try_from(body.user).map_err(|e| DirectoryError::InvalidResponse(e.to_string()))
    }

    async fn users(&self) -> Result<Vec<User>, DirectoryError> {
        let body: UsersResponseDto = self.get_json("/api/users").await?;
        let users = body
            .users
            .into_iter()
            .filter_map(|dto| {
                let id = dto.id;
                User::try_from(dto)
                    .inspect_err(|e| tracing::warn!(id, "Skipping user with invalid id: {}", e))
                    .ok()
            })
            .collect();
        Ok(users)
    }

    async fn history(&self, peer: UserId) -> Result<Vec<HistoryEntry>, DirectoryError> {
        let body: MessagesResponseDto = self.get_json(&format!("/api/messages/{peer}")).await?;
        Ok(body.messages.into_iter().map(HistoryEntry::from).collect())
    }
}
