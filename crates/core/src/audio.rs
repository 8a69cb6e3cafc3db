//! Encoded audio clips exchanged with the transcription and speech gateways

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// MIME type of synthesized examiner speech
pub const SPEECH_MIME_TYPE: &str = "audio/mpeg";

/// Container/codec family of an encoded clip, derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    Mp4,
    Mpeg,
    Mpga,
    Wav,
    M4a,
    /// Browser recorder default
    #[default]
    Webm,
}

impl AudioContainer {
    /// Pick a container from a declared MIME type
    ///
    /// Matching is by substring in a fixed precedence order, so
    /// `audio/mp4;codecs=opus` resolves to `Mp4`. Unknown or missing types
    /// fall back to `Webm`.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        [
            ("mp4", AudioContainer::Mp4),
            ("mpeg", AudioContainer::Mpeg),
            ("mpga", AudioContainer::Mpga),
            ("wav", AudioContainer::Wav),
            ("m4a", AudioContainer::M4a),
            ("webm", AudioContainer::Webm),
        ]
        .into_iter()
        .find(|(needle, _)| mime.contains(needle))
        .map(|(_, container)| container)
        .unwrap_or_default()
    }

    /// File extension used when uploading
    pub fn extension(&self) -> &'static str {
        match self {
            AudioContainer::Mp4 => "mp4",
            AudioContainer::Mpeg => "mpeg",
            AudioContainer::Mpga => "mpga",
            AudioContainer::Wav => "wav",
            AudioContainer::M4a => "m4a",
            AudioContainer::Webm => "webm",
        }
    }
}

/// A complete encoded audio clip
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Bytes,
    /// Declared MIME type, may be empty when unknown
    pub mime_type: String,
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Clip holding synthesized speech
    pub fn speech(data: impl Into<Bytes>) -> Self {
        Self::new(data, SPEECH_MIME_TYPE)
    }

    pub fn container(&self) -> AudioContainer {
        AudioContainer::from_mime(&self.mime_type)
    }

    /// Upload file name, e.g. `audio.webm`
    pub fn file_name(&self) -> String {
        format!("audio.{}", self.container().extension())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_mime() {
        assert_eq!(AudioContainer::from_mime("audio/webm;codecs=opus"), AudioContainer::Webm);
        assert_eq!(AudioContainer::from_mime("audio/mp4"), AudioContainer::Mp4);
        assert_eq!(AudioContainer::from_mime("audio/mpeg"), AudioContainer::Mpeg);
        assert_eq!(AudioContainer::from_mime("audio/x-wav"), AudioContainer::Wav);
        assert_eq!(AudioContainer::from_mime("AUDIO/M4A"), AudioContainer::M4a);
    }

    #[test]
    fn test_unknown_mime_falls_back_to_webm() {
        assert_eq!(AudioContainer::from_mime(""), AudioContainer::Webm);
        assert_eq!(AudioContainer::from_mime("audio/ogg"), AudioContainer::Webm);
        assert_eq!(AudioClip::new(vec![1u8, 2], "").file_name(), "audio.webm");
    }

    #[test]
    fn test_speech_clip() {
        let clip = AudioClip::speech(vec![0u8; 4]);
        assert_eq!(clip.mime_type, "audio/mpeg");
        assert_eq!(clip.len(), 4);
        assert!(!clip.is_empty());
    }
}
