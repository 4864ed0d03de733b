//! Public protocol structs for the gateway's HTTP and WebSocket endpoints.
//! Shapes here are what the mobile screens consume.

use serde::{Deserialize, Serialize};

use crate::catalog::ChapterListing;
use crate::domain::{CommunityMessage, Language, OnlineUser, QuizOutcome, Surface, VocabItem};
use crate::entitlement::{ChapterIndex, ProficiencyLevel, Role};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// A chapter list regained focus.
    Focus {
        #[serde(default)]
        surface: Surface,
        #[serde(default = "first_page")]
        page: u32,
    },
    Logout,
    LoadMessages,
    SendMessage {
        text: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Chapters {
        listing: ChapterListing,
    },
    Presence {
        users: Vec<PresenceOut>,
    },
    Messages {
        messages: Vec<MessageOut>,
    },
    LoggedOut,
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct PresenceOut {
    pub email: String,
    pub name: String,
}

impl From<OnlineUser> for PresenceOut {
    fn from(u: OnlineUser) -> Self {
        let name = crate::domain::display_name(u.display_name.as_deref().or(Some(&u.email)));
        Self { email: u.email, name }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageOut {
    pub text: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<CommunityMessage> for MessageOut {
    fn from(m: CommunityMessage) -> Self {
        let name = crate::domain::display_name(m.display_name.as_deref().or(Some(&m.user_email)));
        Self { text: m.text, name, created_at: m.created_at }
    }
}

fn first_page() -> u32 {
    1
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ChaptersQuery {
    #[serde(default)]
    pub surface: Surface,
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChapterQuery {
    #[serde(default)]
    pub surface: Surface,
    pub level: Option<ProficiencyLevel>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct ChapterOut {
    pub number: ChapterIndex,
    pub level: ProficiencyLevel,
    pub surface: Surface,
    pub items: Vec<VocabItemOut>,
}

#[derive(Debug, Serialize)]
pub struct VocabItemOut {
    #[serde(flatten)]
    pub item: VocabItem,
    /// Translation for the requested UI language.
    pub gloss: String,
}

#[derive(Debug, Serialize)]
pub struct LevelOut {
    pub role: Option<Role>,
    pub level: ProficiencyLevel,
}

#[derive(Debug, Deserialize)]
pub struct QuizResultIn {
    pub chapter: ChapterIndex,
    pub level: ProficiencyLevel,
    pub result: QuizOutcome,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub bangla: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub sentence: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutIn {
    pub level: ProficiencyLevel,
}

#[derive(Debug, Serialize)]
pub struct CheckoutOut {
    pub order_id: String,
    pub approval_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub word: String,
}

#[derive(Debug, Serialize)]
pub struct SearchOut {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_defaults_to_learn_first_page() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"focus"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Focus { surface: Surface::Learn, page: 1 }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"focus","surface":"quiz","page":2}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Focus { surface: Surface::Quiz, page: 2 }));
    }

    #[test]
    fn presence_uses_short_names() {
        let p = PresenceOut::from(OnlineUser { email: "mina.k@example.com".into(), display_name: None });
        assert_eq!(p.name, "mina");
        let json = serde_json::to_value(ServerWsMessage::Presence { users: vec![p] }).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["users"][0]["name"], "mina");
    }

    #[test]
    fn quiz_result_rejects_unknown_level() {
        let bad = serde_json::from_str::<QuizResultIn>(r#"{"chapter":2,"level":"C2","result":"correct"}"#);
        assert!(bad.is_err());
    }
}
