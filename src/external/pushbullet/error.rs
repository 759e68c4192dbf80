use thiserror::Error;

/// Failures talking to the Pushbullet API.
#[derive(Debug, Error)]
pub enum PushbulletError {
    /// The access token was rejected.
    #[error("Invalid Pushbullet access token")]
    InvalidKey,

    /// The account owns no channel with this tag.
    #[error("No such channel: {0}")]
    NoSuchChannel(String),

    #[error("Invalid Pushbullet URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Pushbullet request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Pushbullet API error (status {status}): {message}")]
    Api { status: u16, message: String },
}
