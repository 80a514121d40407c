use base64::Engine;
use bytes::Bytes;

/// MIME type assumed when the uploader did not send one.
pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// One uploaded recording, held in memory for the lifetime of a request.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub mime_type: String,
    pub file_name: String,
    pub bytes: Bytes,
}

impl AudioClip {
    pub fn new(mime_type: Option<&str>, file_name: Option<&str>, bytes: Bytes) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|mime| !mime.is_empty() && *mime != "application/octet-stream")
            .unwrap_or(DEFAULT_AUDIO_MIME)
            .to_owned();
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("audio.{}", extension_for(&mime_type)));
        Self {
            mime_type,
            file_name,
            bytes,
        }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or_default() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        _ => "webm",
    }
}

/// Everything a learner sent for one evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submission {
    /// Recordings in answer order.
    pub clips: Vec<AudioClip>,
    /// Optional question prompts accompanying the recordings.
    pub context: Vec<String>,
}

impl Submission {
    pub fn single(clip: AudioClip) -> Self {
        Self {
            clips: vec![clip],
            context: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{AudioClip, DEFAULT_AUDIO_MIME};

    #[test]
    fn missing_mime_defaults_to_webm() {
        let clip = AudioClip::new(None, None, Bytes::from_static(b"abc"));
        assert_eq!(clip.mime_type, DEFAULT_AUDIO_MIME);
        assert_eq!(clip.file_name, "audio.webm");
    }

    #[test]
    fn octet_stream_is_treated_as_unknown() {
        let clip = AudioClip::new(Some("application/octet-stream"), Some("a.bin"), Bytes::new());
        assert_eq!(clip.mime_type, DEFAULT_AUDIO_MIME);
        assert_eq!(clip.file_name, "a.bin");
    }

    #[test]
    fn file_name_follows_mime() {
        let clip = AudioClip::new(Some("audio/wav"), Some("  "), Bytes::new());
        assert_eq!(clip.file_name, "audio.wav");
    }

    #[test]
    fn base64_uses_standard_alphabet() {
        let clip = AudioClip::new(Some("audio/wav"), None, Bytes::from_static(&[0xfb, 0xff]));
        assert_eq!(clip.to_base64(), "+/8=");
    }
}
