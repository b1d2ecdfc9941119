use proptest::prelude::*;
use satzbau::audio::{audio_filename, AudioLocator};
use satzbau::backends::SpeechBackend;
use satzbau::error::AppError;
use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Produces a short silent WAV and counts calls.
struct SilenceBackend {
    calls: AtomicUsize,
}

impl SpeechBackend for SilenceBackend {
    fn synthesize(&self, _text: &str, voice: Option<&str>) -> std::io::Result<Vec<u8>> {
        assert_eq!(voice, Some("de"));
        self.calls.fetch_add(1, Ordering::SeqCst);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::new(ErrorKind::Other, e))?;
            for _ in 0..160 {
                writer
                    .write_sample(0i16)
                    .map_err(|e| Error::new(ErrorKind::Other, e))?;
            }
            writer.finalize().map_err(|e| Error::new(ErrorKind::Other, e))?;
        }
        Ok(cursor.into_inner())
    }

    fn id(&self) -> &'static str {
        "silence"
    }
}

struct GarbageBackend;

impl SpeechBackend for GarbageBackend {
    fn synthesize(&self, _text: &str, _voice: Option<&str>) -> std::io::Result<Vec<u8>> {
        Ok(b"definitely not RIFF".to_vec())
    }

    fn id(&self) -> &'static str {
        "garbage"
    }
}

#[tokio::test]
async fn test_locate_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let locator = AudioLocator::new(dir.path(), "/static/audio", None, "de");

    let first = locator.locate("Ich lerne Deutsch.").await.unwrap();
    let second = locator.locate("Ich lerne Deutsch.").await.unwrap();
    let other = locator.locate("Ich lerne Spanisch.").await.unwrap();

    assert_eq!(first, second);
    assert_ne!(first.audio_filename, other.audio_filename);
    assert_eq!(first.text, "Ich lerne Deutsch.");
}

#[tokio::test]
async fn test_locate_without_backend_creates_dir_only() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("nested").join("audio");
    let locator = AudioLocator::new(&cache, "/static/audio", None, "de");

    let location = locator.locate("Hallo").await.unwrap();
    assert!(cache.is_dir());
    assert!(!cache.join(&location.audio_filename).exists());
}

#[tokio::test]
async fn test_locate_rejects_only_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let locator = AudioLocator::new(dir.path(), "/static/audio", None, "de");

    let err = locator.locate("").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(ref m) if m == "No text provided"));

    let blank = locator.locate("   ").await.unwrap();
    assert_eq!(blank.text, "   ");
    assert_eq!(blank.audio_filename, audio_filename("   "));
}

#[tokio::test]
async fn test_backend_fills_cache_once() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(SilenceBackend {
        calls: AtomicUsize::new(0),
    });
    let shared: Arc<dyn SpeechBackend> = backend.clone();
    let locator = AudioLocator::new(dir.path(), "/static/audio", Some(shared), "de");

    let location = locator.locate("Guten Abend").await.unwrap();
    let path = dir.path().join(&location.audio_filename);
    assert!(hound::WavReader::open(&path).is_ok());

    locator.locate("Guten Abend").await.unwrap();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    // no part files left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_invalid_backend_output_is_upstream_failure() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn SpeechBackend> = Arc::new(GarbageBackend);
    let locator = AudioLocator::new(dir.path(), "/static/audio", Some(backend), "de");

    let err = locator.locate("Guten Abend").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamFailure(_)));
    assert!(err.to_string().starts_with("Audio generation failed: "));
    assert!(!dir.path().join(audio_filename("Guten Abend")).exists());
}

proptest! {
    #[test]
    fn prop_filename_is_deterministic(text in ".{1,64}") {
        let name = audio_filename(&text);
        prop_assert_eq!(&name, &audio_filename(&text));
        prop_assert!(name.starts_with("german_audio_"));
        prop_assert!(name.ends_with(".wav"));
        let hex = &name["german_audio_".len()..name.len() - 4];
        prop_assert_eq!(hex.len(), 8);
        prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn prop_distinct_texts_rarely_collide(a in "[a-zäöüß ]{1,32}", b in "[a-zäöüß ]{1,32}") {
        prop_assume!(a != b);
        prop_assert_ne!(audio_filename(&a), audio_filename(&b));
    }
}
