use std::{fs, path::Path};

use bytes::Bytes;
use ielts_coach::{AudioClip, Config, Submission};

/// Reads provider credentials and a sample recording for the live test.
///
/// Needs the usual provider variables (see [`Config::from_env`]) plus
/// `COACH_LIVE_AUDIO` pointing at a short recording.
fn load_live_inputs() -> Result<(Config, Submission), String> {
    let audio_path = std::env::var("COACH_LIVE_AUDIO")
        .map_err(|_| "COACH_LIVE_AUDIO is required for the live test".to_owned())?;
    let config = Config::from_env().map_err(|err| err.to_string())?;

    let bytes = fs::read(&audio_path).map_err(|err| format!("{audio_path}: {err}"))?;
    let mime_type = match Path::new(&audio_path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        _ => "audio/webm",
    };
    let file_name = Path::new(&audio_path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned);
    let clip = AudioClip::new(Some(mime_type), file_name.as_deref(), Bytes::from(bytes));

    Ok((config, Submission::single(clip)))
}

#[tokio::test]
async fn live_check_band_roundtrip() {
    let (config, submission) = match load_live_inputs() {
        Ok(values) => values,
        Err(reason) => {
            eprintln!("skipping live test: {reason}");
            return;
        }
    };

    let service = config.build_service().expect("service must build");
    let assessment = service
        .check_band(&submission)
        .await
        .expect("live check band must succeed");

    assert!((0.0..=9.0).contains(&assessment.band));
    assert!(!assessment.feedback.trim().is_empty());
}
