pub mod espeak;

use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

/// Trait that all speech synthesis backends must implement.
/// Backends are blocking; callers run them on a blocking thread.
pub trait SpeechBackend: Send + Sync {
    /// Returns WAV bytes for `text`.
    /// `voice` is an optional backend-specific voice ID.
    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>>;

    /// Returns the unique ID of the backend (e.g., "espeak-ng")
    fn id(&self) -> &'static str;
}

/// Builds the backend named in settings. `"none"` disables synthesis.
pub fn from_name(name: &str, timeout_secs: u64) -> Result<Option<Arc<dyn SpeechBackend>>> {
    match name {
        "none" => Ok(None),
        "espeak" => Ok(Some(Arc::new(espeak::EspeakBackend::new(timeout_secs)))),
        other => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Unknown speech backend: {}", other),
        )),
    }
}

/// Checks that `bytes` holds a readable WAV stream.
pub fn validate_wav(bytes: &[u8]) -> Result<hound::WavSpec> {
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes))
        .map_err(|e| Error::new(ErrorKind::InvalidData, format!("Invalid WAV output: {}", e)))?;
    Ok(reader.spec())
}
