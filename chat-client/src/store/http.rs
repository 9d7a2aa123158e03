//! HTTP message store.
//!
//! Talks JSON to the remote store:
//! - read: `GET {base}?chat_id={c}&user_id={u}` → `{ "messages": [...] }`
//! - write: `POST {base}` `{ chat_id, sender_id, text }` → `{ success, id, time }`
//! - chat list: `GET {base}?user_id={u}` → `{ "chats": [...] }`
//! - seeding: `POST {init}` `{ user_id }`

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use chat_types::{
    ChatsResponse, ConversationId, ConversationSummary, FetchError, InitReport, InitRequest,
    InitResponse, Message, MessagesResponse, SendAck, SendError, SendRequest, SendResponse,
    UserId,
};

use super::MessageStore;

/// Errors building an [`HttpStore`].
#[derive(Debug, Error)]
pub enum HttpStoreError {
    /// The base URL is not an http(s) URL.
    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Error body returned by the store on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Message store backed by the remote HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    init_url: Option<String>,
}

impl HttpStore {
    /// Create a store for `base_url`, optionally with a seeding endpoint.
    pub fn new(
        base_url: &str,
        init_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, HttpStoreError> {
        validate_url(base_url)?;
        if let Some(url) = init_url {
            validate_url(url)?;
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            init_url: init_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the read URL for a conversation.
    pub fn messages_url(&self, conversation: ConversationId, user: UserId) -> String {
        format!(
            "{}?chat_id={}&user_id={}",
            self.base_url, conversation, user
        )
    }

    /// Build the chat list URL for a user.
    pub fn chats_url(&self, user: UserId) -> String {
        format!("{}?user_id={}", self.base_url, user)
    }
}

fn validate_url(url: &str) -> Result<(), HttpStoreError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(HttpStoreError::InvalidUrl(url.to_string()))
    }
}

fn transport_fetch(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

fn transport_send(e: reqwest::Error) -> SendError {
    SendError::Transport(e.to_string())
}

/// Turn a non-2xx write response into a [`SendError`], keeping the store's
/// error text when it sent one.
async fn status_error(response: reqwest::Response) -> SendError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
    SendError::Status { status, message }
}

#[async_trait]
impl MessageStore for HttpStore {
    async fn fetch_messages(
        &self,
        conversation: ConversationId,
        user: UserId,
    ) -> Result<Vec<Message>, FetchError> {
        let response = self
            .http
            .get(self.messages_url(conversation, user))
            .send()
            .await
            .map_err(transport_fetch)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(transport_fetch)?;
        MessagesResponse::from_json(&body)?.into_messages()
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        sender: UserId,
        text: &str,
    ) -> Result<SendAck, SendError> {
        let request = SendRequest {
            chat_id: conversation,
            sender_id: sender,
            text: text.to_string(),
        };
        let response = self
            .http
            .post(self.base_url.as_str())
            .json(&request)
            .send()
            .await
            .map_err(transport_send)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.bytes().await.map_err(transport_send)?;
        Ok(SendResponse::from_json(&body)?.into())
    }

    async fn list_conversations(
        &self,
        user: UserId,
    ) -> Result<Vec<ConversationSummary>, FetchError> {
        let response = self
            .http
            .get(self.chats_url(user))
            .send()
            .await
            .map_err(transport_fetch)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(transport_fetch)?;
        ChatsResponse::parse(&body)
    }

    async fn init_conversations(&self, user: UserId) -> Result<InitReport, SendError> {
        let url = self
            .init_url
            .as_deref()
            .ok_or_else(|| SendError::Transport("no init endpoint configured".into()))?;

        let response = self
            .http
            .post(url)
            .json(&InitRequest { user_id: user })
            .send()
            .await
            .map_err(transport_send)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.bytes().await.map_err(transport_send)?;
        serde_json::from_slice::<InitResponse>(&body)
            .map_err(|e| SendError::Parse(e.to_string()))?
            .into_report()
    }
}
