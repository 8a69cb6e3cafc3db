//! Device-side collaborators: microphone capture and examiner playback

use crate::{AudioClip, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Observable state of a recording device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    #[default]
    Idle,
    AwaitingPermission,
    Recording,
    Stopped,
    Error,
}

/// Microphone capture
///
/// The device is held exclusively between `start` and either `stop` or
/// `release`. Implementations must free it on every exit path.
#[async_trait]
pub trait RecordingCapture: Send + Sync + 'static {
    /// Resolves once capture has begun, or fails with `Error::Capture`
    async fn start(&self) -> Result<()>;

    /// Resolves with the completed clip and frees the device
    async fn stop(&self) -> Result<AudioClip>;

    /// Free the device without producing a clip. Safe to call when idle.
    async fn release(&self);

    fn status(&self) -> CaptureStatus;
}

/// Plays synthesized examiner audio
#[async_trait]
pub trait AudioPlayer: Send + Sync + 'static {
    /// Resolves once playback has actually started
    async fn start(&self, clip: AudioClip) -> Result<()>;

    /// Resolves when the clip that is currently playing has finished
    async fn finished(&self) -> Result<()>;

    /// Stop any playback in progress
    async fn stop(&self);
}
