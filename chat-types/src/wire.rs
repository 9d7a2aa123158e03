//! JSON records exchanged with the remote message store.
//!
//! These mirror the store's HTTP bodies. Conversion into the display model
//! happens here so every store implementation validates records the same way.

use serde::{Deserialize, Serialize};

use crate::{
    ConversationId, DeliveryStatus, FetchError, Message, MessageId, Origin, SendError, UserId,
};

/// One message as returned by the store's read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Message body.
    pub text: String,
    /// Whether `user_id` from the request authored it.
    pub is_mine: bool,
    /// Pre-formatted display time.
    pub time: String,
    /// Author's user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,
    /// Author's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Author's avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Delivery status; absent means the message has been read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
}

impl MessageRecord {
    /// Convert into the display model.
    ///
    /// Fails if the id lies outside the store namespace.
    pub fn into_message(self) -> Result<Message, FetchError> {
        let id = MessageId::server(self.id).ok_or_else(|| {
            FetchError::InvalidRecord(format!("non-positive message id {}", self.id))
        })?;
        Ok(Message {
            id,
            text: self.text,
            origin: Origin::from_is_mine(self.is_mine),
            time: self.time,
            status: self.status.unwrap_or_default(),
            sender: self.sender,
        })
    }
}

/// Body of the read endpoint: `{ "messages": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Messages in store order. `None` when the field is absent or null.
    #[serde(default)]
    pub messages: Option<Vec<MessageRecord>>,
}

impl MessagesResponse {
    /// Parse a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Validate and convert every record, keeping store order.
    pub fn into_messages(self) -> Result<Vec<Message>, FetchError> {
        self.messages
            .ok_or(FetchError::MissingMessages)?
            .into_iter()
            .map(MessageRecord::into_message)
            .collect()
    }
}

/// Body of the write endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// Target conversation.
    pub chat_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// Message body, sent as typed.
    pub text: String,
}

/// Response of the write endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Whether the store accepted the write.
    pub success: bool,
    /// Id assigned to the new message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display time of the new message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl SendResponse {
    /// Parse a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, SendError> {
        serde_json::from_slice(body).map_err(|e| SendError::Parse(e.to_string()))
    }
}

impl From<SendResponse> for SendAck {
    fn from(response: SendResponse) -> Self {
        Self {
            accepted: response.success,
            id: response.id.and_then(MessageId::server),
            time: response.time,
        }
    }
}

/// Outcome of a well-formed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    /// `false` means the store rejected the write without a transport error.
    pub accepted: bool,
    /// Id the store assigned, if reported.
    pub id: Option<MessageId>,
    /// Display time the store assigned, if reported.
    pub time: Option<String>,
}

impl SendAck {
    /// An accepted write with no extra details.
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            id: None,
            time: None,
        }
    }

    /// A rejected write.
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            id: None,
            time: None,
        }
    }
}

/// One entry of the chat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation id.
    pub id: ConversationId,
    /// Peer name or group name.
    pub name: String,
    /// Peer or group avatar.
    pub avatar: String,
    /// Text of the most recent message.
    #[serde(rename = "lastMessage")]
    pub last_message: String,
    /// Label of the most recent activity (`14:23`, `Yesterday`, or empty).
    pub time: String,
    /// Unread message count.
    #[serde(default)]
    pub unread: u32,
}

/// Body of the chat list endpoint: `{ "chats": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatsResponse {
    /// Chats ordered by most recent activity. `None` when absent.
    #[serde(default)]
    pub chats: Option<Vec<ConversationSummary>>,
}

impl ChatsResponse {
    /// Parse a response body and unwrap the chat list.
    pub fn parse(body: &[u8]) -> Result<Vec<ConversationSummary>, FetchError> {
        let response: Self =
            serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))?;
        response
            .chats
            .ok_or_else(|| FetchError::Parse("response is missing the chats field".into()))
    }
}

/// Body of the chat seeding endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    /// User to seed chats for.
    pub user_id: UserId,
}

/// Raw response of the chat seeding endpoint.
///
/// The store answers `{ success, created_chats }` on first call and
/// `{ message, count }` once the user already has chats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    /// Present on a fresh seed.
    #[serde(default)]
    pub success: Option<bool>,
    /// Chats created by this call.
    #[serde(default)]
    pub created_chats: Option<u32>,
    /// Present when nothing was created.
    #[serde(default)]
    pub message: Option<String>,
    /// Existing chat count when nothing was created.
    #[serde(default)]
    pub count: Option<u32>,
}

impl InitResponse {
    /// Interpret the response.
    pub fn into_report(self) -> Result<InitReport, SendError> {
        match (self.success, self.created_chats, self.count) {
            (Some(true), Some(created), _) => Ok(InitReport::Created { chats: created }),
            (_, _, Some(existing)) => Ok(InitReport::AlreadyInitialized { chats: existing }),
            (Some(false), _, _) => Err(SendError::Parse(
                self.message.unwrap_or_else(|| "seeding rejected".into()),
            )),
            _ => Err(SendError::Parse("unrecognized init response".into())),
        }
    }
}

/// Result of seeding chats for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitReport {
    /// Chats were created by this call.
    Created {
        /// Number of chats created.
        chats: u32,
    },
    /// The user already had chats; nothing changed.
    AlreadyInitialized {
        /// Number of existing chat memberships.
        chats: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_read_body() {
        let body = br#"{"messages":[
            {"id":1,"text":"Privet","sender_id":2,"time":"14:23","sender":"anna","avatar":"a","is_mine":false},
            {"id":2,"text":"hello","sender_id":1,"time":"14:24","sender":"me","avatar":"b","is_mine":true}
        ]}"#;

        let messages = MessagesResponse::from_json(body)
            .unwrap()
            .into_messages()
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, MessageId::new(1));
        assert_eq!(messages[0].origin, Origin::Other);
        assert_eq!(messages[0].sender.as_deref(), Some("anna"));
        assert_eq!(messages[1].text, "hello");
        assert_eq!(messages[1].origin, Origin::Mine);
        assert_eq!(messages[1].status, DeliveryStatus::Read);
    }

    #[test]
    fn explicit_status_is_kept() {
        let body = br#"{"messages":[{"id":5,"text":"x","is_mine":true,"time":"10:00","status":"delivered"}]}"#;
        let messages = MessagesResponse::from_json(body)
            .unwrap()
            .into_messages()
            .unwrap();
        assert_eq!(messages[0].status, DeliveryStatus::Delivered);
    }

    #[test]
    fn missing_messages_field_is_an_error() {
        let response = MessagesResponse::from_json(br#"{"chats":[]}"#).unwrap();
        assert_eq!(response.into_messages(), Err(FetchError::MissingMessages));

        let response = MessagesResponse::from_json(br#"{"messages":null}"#).unwrap();
        assert_eq!(response.into_messages(), Err(FetchError::MissingMessages));
    }

    #[test]
    fn empty_messages_is_not_an_error() {
        let messages = MessagesResponse::from_json(br#"{"messages":[]}"#)
            .unwrap()
            .into_messages()
            .unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn non_positive_record_id_is_rejected() {
        let body = br#"{"messages":[{"id":-1,"text":"x","is_mine":true,"time":"10:00"}]}"#;
        let result = MessagesResponse::from_json(body).unwrap().into_messages();
        assert!(matches!(result, Err(FetchError::InvalidRecord(_))));
    }

    #[test]
    fn garbage_body_is_parse_error() {
        assert!(matches!(
            MessagesResponse::from_json(b"<html>"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn send_request_uses_store_field_names() {
        let request = SendRequest {
            chat_id: ConversationId::new(4),
            sender_id: UserId::new(1),
            text: "hello".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"chat_id": 4, "sender_id": 1, "text": "hello"})
        );
    }

    #[test]
    fn send_response_maps_to_ack() {
        let response =
            SendResponse::from_json(br#"{"id":31,"time":"09:15","success":true}"#).unwrap();
        let ack = SendAck::from(response);
        assert!(ack.accepted);
        assert_eq!(ack.id, Some(MessageId::new(31)));
        assert_eq!(ack.time.as_deref(), Some("09:15"));
    }

    #[test]
    fn send_response_without_success_is_malformed() {
        assert!(matches!(
            SendResponse::from_json(br#"{"id":31}"#),
            Err(SendError::Parse(_))
        ));
    }

    #[test]
    fn chat_list_uses_camel_case_last_message() {
        let body = br#"{"chats":[{"id":3,"name":"Dmitry","avatar":"D","lastMessage":"Sent the files","time":"11:20","unread":0}]}"#;
        let chats = ChatsResponse::parse(body).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, ConversationId::new(3));
        assert_eq!(chats[0].last_message, "Sent the files");
    }

    #[test]
    fn init_response_variants() {
        let fresh = InitResponse {
            success: Some(true),
            created_chats: Some(4),
            ..Default::default()
        };
        assert_eq!(fresh.into_report(), Ok(InitReport::Created { chats: 4 }));

        let existing: InitResponse =
            serde_json::from_str(r#"{"message":"Chats already initialized","count":4}"#).unwrap();
        assert_eq!(
            existing.into_report(),
            Ok(InitReport::AlreadyInitialized { chats: 4 })
        );

        assert!(InitResponse::default().into_report().is_err());
    }
}
