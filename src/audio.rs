use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backends::{self, SpeechBackend};
use crate::config_loader::Settings;
use crate::error::{AppError, Result};

const FAILURE: &str = "Audio generation failed";

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache filename for `text`: first 8 hex digits of its MD5 digest.
pub fn audio_filename(text: &str) -> String {
    let digest = format!("{:x}", md5::compute(text.as_bytes()));
    format!("german_audio_{}.wav", &digest[..8])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioLocation {
    pub audio_url: String,
    pub audio_filename: String,
    pub text: String,
}

/// Maps text to a deterministic WAV path in the audio cache and, when a
/// speech backend is configured, fills that path on first request.
#[derive(Clone)]
pub struct AudioLocator {
    dir: PathBuf,
    url_prefix: String,
    backend: Option<Arc<dyn SpeechBackend>>,
    voice: String,
}

impl AudioLocator {
    pub fn new(
        dir: impl Into<PathBuf>,
        url_prefix: &str,
        backend: Option<Arc<dyn SpeechBackend>>,
        voice: &str,
    ) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            backend,
            voice: voice.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> std::io::Result<Self> {
        let backend = backends::from_name(&settings.tts_backend, settings.tts_timeout_secs)?;
        Ok(Self::new(
            &settings.audio_dir,
            &settings.audio_url_prefix,
            backend,
            &settings.tts_voice,
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }

    pub async fn locate(&self, text: &str) -> Result<AudioLocation> {
        if text.is_empty() {
            return Err(AppError::invalid("No text provided"));
        }

        let filename = audio_filename(text);

        // create_dir_all tolerates a concurrent creator
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::upstream(FAILURE, e))?;

        let path = self.dir.join(&filename);
        let cached = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::upstream(FAILURE, e))?;

        if !cached {
            match &self.backend {
                Some(backend) => self.synthesize_to(backend.clone(), text, &path).await?,
                None => log::debug!(
                    "No speech backend configured; {} left to an external synthesizer",
                    filename
                ),
            }
        }

        Ok(AudioLocation {
            audio_url: self.url_for(&filename),
            audio_filename: filename,
            text: text.to_string(),
        })
    }

    async fn synthesize_to(
        &self,
        backend: Arc<dyn SpeechBackend>,
        text: &str,
        path: &Path,
    ) -> Result<()> {
        log::info!("Synthesizing {:?} with {}", path, backend.id());

        let text = text.to_string();
        let voice = self.voice.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            let bytes = backend.synthesize(&text, Some(&voice))?;
            backends::validate_wav(&bytes)?;
            Ok::<_, std::io::Error>(bytes)
        })
        .await
        .map_err(|e| AppError::upstream(FAILURE, e))?
        .map_err(|e| AppError::upstream(FAILURE, e))?;

        // Readers only ever see a complete WAV at `path`.
        let part = path.with_extension(format!(
            "wav.{}.{}.part",
            std::process::id(),
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&part, &bytes)
            .await
            .map_err(|e| AppError::upstream(FAILURE, e))?;
        if let Err(e) = tokio::fs::rename(&part, path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(AppError::upstream(FAILURE, e));
        }
        Ok(())
    }
}
