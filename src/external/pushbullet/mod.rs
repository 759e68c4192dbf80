//! Pushbullet v2 API.
//!
//! Reference: https://docs.pushbullet.com/

mod client;
mod error;
mod types;

pub use client::PushbulletClient;
pub use error::PushbulletError;
pub use types::{Channel, JPEG_MIME, Target, UploadedFile, User};
