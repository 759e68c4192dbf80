use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// MIME type of every uploaded snapshot.
pub const JPEG_MIME: &str = "image/jpeg";

/// The account behind an access token (`GET /users/me`).
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub iden: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A channel owned by the account (`GET /channels`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub iden: String,
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Where a push goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// All devices of the account.
    Account,
    /// Subscribers of a channel, by tag.
    Channel(String),
}

impl Target {
    pub fn channel_tag(&self) -> Option<&str> {
        match self {
            Target::Account => None,
            Target::Channel(tag) => Some(tag),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Account => f.write_str("account"),
            Target::Channel(tag) => write!(f, "channel '{}'", tag),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct UploadRequest<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadTicket {
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub upload_url: String,
    /// Form fields required by the legacy upload flow.
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
}

/// A file that has been uploaded and can be referenced from a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(super) enum PushKind<'a> {
    Note {
        title: &'a str,
        body: &'a str,
    },
    File {
        file_name: &'a str,
        file_type: &'a str,
        file_url: &'a str,
        body: &'a str,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct PushRequest<'a> {
    #[serde(flatten)]
    pub kind: PushKind<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_tag: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
