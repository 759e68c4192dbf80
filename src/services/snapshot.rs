//! Webcam snapshots: fetch and optional flip/rotate through ffmpeg.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::process::Command;

use crate::config::WebcamConfig;
use crate::external::client::HTTP_CLIENT;

const PIXEL_FORMAT: &str = "yuv420p";

/// The `-vf` argument for the configured transforms.
///
/// Pixel format conversion always comes first; some cameras deliver
/// formats the flip filters cannot handle.
pub fn filter_chain(webcam: &WebcamConfig) -> String {
    let mut filters = vec![format!("format={}", PIXEL_FORMAT)];
    if webcam.rotate90 {
        // 90 degrees counter clockwise
        filters.push("transpose=2".to_string());
    }
    if webcam.flip_h {
        filters.push("hflip".to_string());
    }
    if webcam.flip_v {
        filters.push("vflip".to_string());
    }
    filters.join(",")
}

#[derive(Debug, Clone)]
pub struct Snapshotter {
    webcam: WebcamConfig,
}

impl Snapshotter {
    pub fn new(webcam: WebcamConfig) -> Self {
        Self { webcam }
    }

    pub fn snapshot_url(&self) -> Option<&str> {
        self.webcam.snapshot.as_deref().filter(|url| !url.is_empty())
    }

    /// Fetch and post-process a snapshot. `Ok(None)` when no webcam is configured.
    pub async fn capture(&self) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(url) = self.snapshot_url() else {
            return Ok(None);
        };

        let image = HTTP_CLIENT
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch snapshot from {}", url))?
            .bytes()
            .await
            .context("Failed to read snapshot body")?;

        Ok(Some(self.process(image.to_vec()).await))
    }

    /// Apply the configured flips and rotation.
    ///
    /// Returns the input unchanged when nothing is configured, ffmpeg is
    /// unusable, or the conversion fails.
    pub async fn process(&self, image: Vec<u8>) -> Vec<u8> {
        if !self.webcam.needs_transform() {
            return image;
        }
        let Some(ffmpeg) = self.ffmpeg() else {
            tracing::debug!("ffmpeg not configured or not executable, sending snapshot as is");
            return image;
        };

        match self.transform(&ffmpeg, &image).await {
            Ok(processed) => {
                tracing::info!("Rotated/flipped image with ffmpeg");
                processed
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "Failed to rotate/flip image with ffmpeg");
                image
            }
        }
    }

    fn ffmpeg(&self) -> Option<PathBuf> {
        let path = PathBuf::from(self.webcam.ffmpeg.as_deref().filter(|p| !p.is_empty())?);
        is_executable(&path).then_some(path)
    }

    async fn transform(&self, ffmpeg: &Path, image: &[u8]) -> anyhow::Result<Vec<u8>> {
        // ffmpeg picks the decoder from the extension
        let dir = tempfile::tempdir().context("Failed to create temporary directory")?;
        let input = dir.path().join("snapshot.jpg");
        let output = dir.path().join("processed.jpg");
        tokio::fs::write(&input, image)
            .await
            .context("Failed to write snapshot")?;

        let filters = filter_chain(&self.webcam);
        tracing::info!(
            ffmpeg = %ffmpeg.display(),
            filters = %filters,
            "Running ffmpeg on snapshot"
        );

        let result = Command::new(ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .arg("-vf")
            .arg(&filters)
            .arg(&output)
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to run ffmpeg")?;

        if !result.status.success() {
            anyhow::bail!(
                "ffmpeg exited with {}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        tokio::fs::read(&output)
            .await
            .context("Failed to read ffmpeg output")
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
