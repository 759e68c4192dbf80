use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::error::PushbulletError;
use super::types::{
    Channel, ChannelList, ErrorEnvelope, JPEG_MIME, PushKind, PushRequest, Target, UploadRequest,
    UploadTicket, UploadedFile, User,
};
use crate::config::PushbulletConfig;
use crate::external::client::HTTP_CLIENT;

const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Pushbullet v2 API client bound to one access token.
#[derive(Clone)]
pub struct PushbulletClient {
    base_url: Url,
    access_token: String,
    timeout: Duration,
}

impl std::fmt::Debug for PushbulletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushbulletClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PushbulletClient {
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PushbulletError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| PushbulletError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_url,
            access_token: access_token.into(),
            timeout,
        })
    }

    pub fn from_config(
        config: &PushbulletConfig,
        access_token: impl Into<String>,
    ) -> Result<Self, PushbulletError> {
        Self::new(
            &config.api_url,
            access_token,
            Duration::from_secs(config.timeout),
        )
    }

    /// Build a client and check the token against `/users/me`.
    pub async fn connect(
        config: &PushbulletConfig,
        access_token: impl Into<String>,
    ) -> Result<(Self, User), PushbulletError> {
        let client = Self::from_config(config, access_token)?;
        let user = client.me().await?;
        tracing::debug!(user = %user.iden, "Pushbullet access token accepted");
        Ok((client, user))
    }

    fn endpoint(&self, path: &str) -> Result<Url, PushbulletError> {
        self.base_url
            .join(path)
            .map_err(|e| PushbulletError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .timeout(self.timeout)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PushbulletError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(PushbulletError::InvalidKey);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PushbulletError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn me(&self) -> Result<User, PushbulletError> {
        let url = self.endpoint("users/me")?;
        self.send(HTTP_CLIENT.get(url)).await
    }

    /// All channels owned by the account, following pagination cursors.
    pub async fn channels(&self) -> Result<Vec<Channel>, PushbulletError> {
        let url = self.endpoint("channels")?;
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = HTTP_CLIENT.get(url.clone());
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }
            let page: ChannelList = self.send(request).await?;
            channels.extend(page.channels.into_iter().filter(|c| c.active));

            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(channels)
    }

    /// Map an optional channel tag to a push target.
    pub async fn resolve_target(
        &self,
        channel_tag: Option<&str>,
    ) -> Result<Target, PushbulletError> {
        let Some(tag) = channel_tag.filter(|t| !t.is_empty()) else {
            return Ok(Target::Account);
        };

        let channels = self.channels().await?;
        if channels.iter().any(|c| c.tag == tag) {
            tracing::info!(channel = %tag, "Connected to Pushbullet on channel");
            Ok(Target::Channel(tag.to_string()))
        } else {
            Err(PushbulletError::NoSuchChannel(tag.to_string()))
        }
    }

    pub async fn push_note(
        &self,
        target: &Target,
        title: &str,
        body: &str,
    ) -> Result<(), PushbulletError> {
        let push = PushRequest {
            kind: PushKind::Note { title, body },
            channel_tag: target.channel_tag(),
        };
        self.push(&push).await
    }

    pub async fn push_file(
        &self,
        target: &Target,
        file: &UploadedFile,
        body: &str,
    ) -> Result<(), PushbulletError> {
        let push = PushRequest {
            kind: PushKind::File {
                file_name: &file.file_name,
                file_type: &file.file_type,
                file_url: &file.file_url,
                body,
            },
            channel_tag: target.channel_tag(),
        };
        self.push(&push).await
    }

    async fn push(&self, push: &PushRequest<'_>) -> Result<(), PushbulletError> {
        let url = self.endpoint("pushes")?;
        let _: serde_json::Value = self.send(HTTP_CLIENT.post(url).json(push)).await?;
        Ok(())
    }

    /// Upload a JPEG so it can be attached to a file push.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, PushbulletError> {
        let url = self.endpoint("upload-request")?;
        let ticket: UploadTicket = self
            .send(HTTP_CLIENT.post(url).json(&UploadRequest {
                file_name,
                file_type: JPEG_MIME,
            }))
            .await?;

        let mut form = Form::new();
        for (key, value) in ticket.data.unwrap_or_default() {
            form = form.text(key, value);
        }
        let part = Part::bytes(bytes)
            .file_name(ticket.file_name.clone())
            .mime_str(&ticket.file_type)?;
        form = form.part("file", part);

        // The upload URL is pre-signed; no access token is sent there.
        let response = HTTP_CLIENT
            .post(&ticket.upload_url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PushbulletError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(UploadedFile {
            file_name: ticket.file_name,
            file_type: ticket.file_type,
            file_url: ticket.file_url,
        })
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match (envelope.error.kind, envelope.error.message) {
            (Some(kind), Some(message)) => format!("{}: {}", kind, message),
            (None, Some(message)) => message,
            (Some(kind), None) => kind,
            (None, None) => body.to_string(),
        },
        Err(_) if body.is_empty() => "empty response".to_string(),
        Err(_) => body.to_string(),
    }
}
