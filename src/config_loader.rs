use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // HTTP surface
    pub bind_host: String,
    pub port: u16,
    pub api_prefix: String,
    // Chat completion provider (OpenAI compatible)
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub request_timeout_secs: u64,
    pub sentence_max_tokens: u32,
    pub sentence_temperature: f32,
    pub analysis_max_tokens: u32,
    pub analysis_temperature: f32,
    // Audio cache
    pub audio_dir: String,
    pub audio_url_prefix: String,
    pub tts_backend: String, // "none" or "espeak"
    pub tts_voice: String,
    pub tts_timeout_secs: u64,
    // Rate limiting, requests per minute per client
    pub rate_limit_generate: u32,
    pub rate_limit_audio: u32,
    pub rate_limit_export: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5000,
            api_prefix: "/api".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4.1-mini".to_string(),
            request_timeout_secs: 60,
            sentence_max_tokens: 100,
            sentence_temperature: 0.7,
            analysis_max_tokens: 1000,
            analysis_temperature: 0.3,
            audio_dir: "static/audio".to_string(),
            audio_url_prefix: "/static/audio".to_string(),
            tts_backend: "none".to_string(),
            tts_voice: "de".to_string(),
            tts_timeout_secs: 10,
            rate_limit_generate: 0,
            rate_limit_audio: 0,
            rate_limit_export: 0,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(None)
    }

    /// Defaults, then `Satzbau.*` in the working directory, then the user
    /// config dir, then an explicit file if given, then `SATZBAU_*` env vars.
    pub fn load(explicit: Option<&str>) -> Result<Self, config::ConfigError> {
        let user_config = dirs::config_dir()
            .map(|d| d.join("satzbau").join("Satzbau"))
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Satzbau-user".to_string());

        let mut builder = Config::builder()
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("api_prefix", "/api")?
            .set_default("openai_base_url", "https://api.openai.com/v1")?
            .set_default("openai_api_key", "")?
            .set_default("openai_model", "gpt-4.1-mini")?
            .set_default("request_timeout_secs", 60)?
            .set_default("sentence_max_tokens", 100)?
            .set_default("sentence_temperature", 0.7)?
            .set_default("analysis_max_tokens", 1000)?
            .set_default("analysis_temperature", 0.3)?
            .set_default("audio_dir", "static/audio")?
            .set_default("audio_url_prefix", "/static/audio")?
            .set_default("tts_backend", "none")?
            .set_default("tts_voice", "de")?
            .set_default("tts_timeout_secs", 10)?
            .set_default("rate_limit_generate", 0)?
            .set_default("rate_limit_audio", 0)?
            .set_default("rate_limit_export", 0)?
            .add_source(File::with_name("Satzbau").required(false))
            .add_source(File::with_name(&user_config).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // e.g. SATZBAU_OPENAI_MODEL, SATZBAU_PORT
        builder = builder.add_source(config::Environment::with_prefix("SATZBAU"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        if settings.openai_api_key.is_empty() {
            settings.openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        for (name, value) in [
            ("sentence_temperature", self.sentence_temperature),
            ("analysis_temperature", self.analysis_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(config::ConfigError::Message(format!(
                    "Invalid {}: {}. Must be between 0.0 and 2.0",
                    name, value
                )));
            }
        }
        if self.sentence_max_tokens == 0 || self.analysis_max_tokens == 0 {
            return Err(config::ConfigError::Message(
                "max_tokens settings must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("api_prefix", &self.api_prefix),
            ("audio_url_prefix", &self.audio_url_prefix),
        ] {
            if !value.starts_with('/') {
                return Err(config::ConfigError::Message(format!(
                    "{} must start with '/': {}",
                    name, value
                )));
            }
        }
        match self.tts_backend.as_str() {
            "none" | "espeak" => {}
            other => {
                return Err(config::ConfigError::Message(format!(
                    "Unknown tts_backend: {}. Expected \"none\" or \"espeak\"",
                    other
                )));
            }
        }
        Ok(())
    }
}
