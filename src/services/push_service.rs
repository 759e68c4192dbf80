//! Delivery of notes and webcam snapshots to Pushbullet.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::RwLock;

use super::snapshot::Snapshotter;
use crate::config::PushbulletConfig;
use crate::external::pushbullet::{PushbulletClient, PushbulletError, Target};

/// Title of the message sent by the test command.
pub const TEST_TITLE: &str = "Test from the OctoPrint PushBullet Plugin";

/// Body of the test message when the caller gives none.
pub const DEFAULT_TEST_MESSAGE: &str = "Testing, 1, 2, 3, 4...";

/// A connected client plus the destination its pushes go to.
#[derive(Debug, Clone)]
pub struct PushSender {
    client: PushbulletClient,
    target: Target,
}

impl PushSender {
    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Outcome of the test command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// A sender was built; `true` when the message went out.
    Sent(bool),
    UnknownChannel,
    InvalidKey,
}

/// Pushbullet delivery with the currently configured sender.
#[derive(Clone)]
pub struct PushService {
    config: PushbulletConfig,
    snapshots: Snapshotter,
    sender: Arc<RwLock<Option<PushSender>>>,
    /// Bumped whenever a connect starts; only the latest one may install its sender.
    generation: Arc<AtomicU64>,
}

impl PushService {
    pub fn new(config: PushbulletConfig, snapshots: Snapshotter) -> Self {
        Self {
            config,
            snapshots,
            sender: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build a sender for `access_token`, targeting `channel` when given.
    ///
    /// # Errors
    /// `InvalidKey` when the token is rejected, `NoSuchChannel` when the
    /// account owns no channel with that tag, anything else as reported.
    pub async fn create_sender(
        &self,
        access_token: &str,
        channel: Option<&str>,
    ) -> Result<PushSender, PushbulletError> {
        let (client, _) = PushbulletClient::connect(&self.config, access_token).await?;
        let target = client.resolve_target(channel).await?;
        tracing::info!(target = %target, "Connected to Pushbullet");
        Ok(PushSender { client, target })
    }

    /// Replace the current sender.
    ///
    /// An unknown channel falls back to pushing to the whole account. Any
    /// other failure leaves no sender.
    pub async fn connect(&self, access_token: Option<&str>, channel: Option<&str>) {
        let generation = self.next_generation();
        self.connect_as(generation, access_token, channel).await;
    }

    /// Connect in the background. A later `connect` or `reconnect` wins even
    /// when this one finishes after it.
    pub fn reconnect(&self, access_token: Option<String>, channel: Option<String>) {
        let generation = self.next_generation();
        let push = self.clone();
        tokio::spawn(async move {
            push.connect_as(generation, access_token.as_deref(), channel.as_deref())
                .await;
        });
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn connect_as(&self, generation: u64, access_token: Option<&str>, channel: Option<&str>) {
        let sender = match access_token.filter(|t| !t.is_empty()) {
            None => {
                tracing::info!("No Pushbullet access token configured");
                None
            }
            Some(token) => match self.create_sender(token, channel).await {
                Ok(sender) => Some(sender),
                Err(PushbulletError::NoSuchChannel(tag)) => {
                    tracing::warn!(
                        channel = %tag,
                        "Could not find channel, please check your configuration!"
                    );
                    self.create_sender(token, None)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(error = %e, "Error while connecting to Pushbullet")
                        })
                        .ok()
                }
                Err(PushbulletError::InvalidKey) => {
                    tracing::error!(
                        "Invalid Pushbullet access token, please check your configuration!"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error while connecting to Pushbullet");
                    None
                }
            },
        };

        let mut current = self.sender.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding superseded Pushbullet connection");
            return;
        }
        *current = sender;
    }

    pub async fn is_connected(&self) -> bool {
        self.sender.read().await.is_some()
    }

    pub async fn current_target(&self) -> Option<Target> {
        self.sender.read().await.as_ref().map(|s| s.target.clone())
    }

    /// Push `title`/`body`, attaching a webcam snapshot when one is available.
    ///
    /// Uses `sender` when given, the connected sender otherwise. Falls back
    /// to a plain note when the snapshot cannot be fetched, uploaded or
    /// pushed. Returns whether anything was delivered.
    pub async fn send_message_with_webcam_image(
        &self,
        title: &str,
        body: &str,
        filename: Option<String>,
        sender: Option<&PushSender>,
    ) -> bool {
        let current;
        let sender = match sender {
            Some(sender) => sender,
            None => {
                current = self.sender.read().await.clone();
                match current.as_ref() {
                    Some(sender) => sender,
                    None => {
                        tracing::debug!("No Pushbullet sender, dropping message");
                        return false;
                    }
                }
            }
        };

        let filename = filename.unwrap_or_else(random_test_filename);

        match self.snapshots.capture().await {
            Ok(Some(image)) => {
                if self.send_file(sender, &filename, image, body).await {
                    return true;
                }
                tracing::warn!("Could not send a file message with the webcam image, sending only a note");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    error = %format!("{:#}", e),
                    "Exception while fetching snapshot from webcam, sending only a note"
                );
            }
        }

        self.send_note(sender, title, body).await
    }

    async fn send_note(&self, sender: &PushSender, title: &str, body: &str) -> bool {
        match sender.client.push_note(&sender.target, title, body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Error while pushing a note");
                false
            }
        }
    }

    async fn send_file(
        &self,
        sender: &PushSender,
        filename: &str,
        image: Vec<u8>,
        body: &str,
    ) -> bool {
        let upload = match sender.client.upload_file(filename, image).await {
            Ok(upload) => upload,
            Err(e) => {
                tracing::error!(error = %e, "Error while uploading snapshot, sending only a note");
                return false;
            }
        };

        match sender.client.push_file(&sender.target, &upload, body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Error while pushing snapshot, sending only a note");
                false
            }
        }
    }

    /// Send a test message with a throwaway sender built from the given credentials.
    pub async fn test(
        &self,
        access_token: Option<&str>,
        channel: Option<&str>,
        message: Option<&str>,
    ) -> TestOutcome {
        let Some(token) = access_token.filter(|t| !t.is_empty()) else {
            return TestOutcome::InvalidKey;
        };

        let sender = match self.create_sender(token, channel).await {
            Ok(sender) => Some(sender),
            Err(PushbulletError::NoSuchChannel(tag)) => {
                tracing::warn!(channel = %tag, "Could not find channel, please check your configuration!");
                return TestOutcome::UnknownChannel;
            }
            Err(PushbulletError::InvalidKey) => return TestOutcome::InvalidKey,
            Err(e) => {
                tracing::error!(error = %e, "Error while instantiating Pushbullet");
                None
            }
        };

        let Some(sender) = sender else {
            return TestOutcome::Sent(false);
        };

        let body = message.unwrap_or(DEFAULT_TEST_MESSAGE);
        TestOutcome::Sent(
            self.send_message_with_webcam_image(TEST_TITLE, body, None, Some(&sender))
                .await,
        )
    }
}

/// `test-<16 random letters>.jpg`
fn random_test_filename() -> String {
    let letters: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .filter(char::is_ascii_alphabetic)
        .take(16)
        .collect();
    format!("test-{}.jpg", letters)
}
