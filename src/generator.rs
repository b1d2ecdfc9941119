use serde::Serialize;
use std::sync::Arc;

use crate::analysis::SentenceAnalysis;
use crate::catalog::{self, ProficiencyLevel};
use crate::config_loader::Settings;
use crate::cortex::{CompletionProvider, CompletionRequest, CortexError};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSentence {
    pub sentence: String,
    pub level: String,
    pub topic: String,
    pub analysis: SentenceAnalysis,
}

/// Sampling bounds for the two completion calls.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub sentence_max_tokens: u32,
    pub sentence_temperature: f32,
    pub analysis_max_tokens: u32,
    pub analysis_temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            sentence_max_tokens: 100,
            sentence_temperature: 0.7,
            analysis_max_tokens: 1000,
            analysis_temperature: 0.3,
        }
    }
}

impl From<&Settings> for GenerationParams {
    fn from(s: &Settings) -> Self {
        Self {
            sentence_max_tokens: s.sentence_max_tokens,
            sentence_temperature: s.sentence_temperature,
            analysis_max_tokens: s.analysis_max_tokens,
            analysis_temperature: s.analysis_temperature,
        }
    }
}

#[derive(Clone)]
pub struct SentenceGenerator {
    provider: Arc<dyn CompletionProvider>,
    params: GenerationParams,
}

impl SentenceGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, params: GenerationParams) -> Self {
        Self { provider, params }
    }

    /// Generates one sentence for `level`/`topic` and analyses it.
    ///
    /// The analysis call never fails the request on bad output: an
    /// undecodable reply is replaced by [`SentenceAnalysis::fallback`].
    /// Transport failures of either call do fail it, as does a blank sentence.
    pub async fn generate(&self, level: &str, topic: &str) -> Result<GeneratedSentence> {
        let lvl = ProficiencyLevel::from_code(level)
            .ok_or_else(|| AppError::invalid("Invalid language level"))?;
        if !catalog::is_topic(topic) {
            return Err(AppError::invalid("Invalid topic"));
        }

        let sentence = self
            .provider
            .complete(CompletionRequest {
                prompt: sentence_prompt(lvl, topic),
                max_tokens: self.params.sentence_max_tokens,
                temperature: self.params.sentence_temperature,
            })
            .await?
            .trim()
            .to_string();
        if sentence.is_empty() {
            return Err(CortexError::EmptyReply.into());
        }

        log::info!("Generated {} sentence on '{}': {}", lvl.code(), topic, sentence);

        let raw = self
            .provider
            .complete(CompletionRequest {
                prompt: analysis_prompt(&sentence),
                max_tokens: self.params.analysis_max_tokens,
                temperature: self.params.analysis_temperature,
            })
            .await?;

        let analysis = SentenceAnalysis::parse_or_fallback(&raw);

        Ok(GeneratedSentence {
            sentence,
            level: level.to_string(),
            topic: topic.to_string(),
            analysis,
        })
    }
}

pub fn sentence_prompt(level: ProficiencyLevel, topic: &str) -> String {
    format!(
        "Generate a German sentence for language level {code} ({desc}) \
about the topic \"{topic}\". The sentence should be:\n\
- Appropriate for {code} level learners\n\
- Natural and commonly used\n\
- Related to {topic}\n\
- Between 8-20 words long\n\n\
Return only the German sentence, nothing else.",
        code = level.code(),
        desc = level.description(),
        topic = topic,
    )
}

const ANALYSIS_EXAMPLE: &str = r#"{
    "grammar": {
        "tense": "present",
        "mood": "indicative",
        "clause_type": "main",
        "structure": "Subject + Verb + Time + Object structure",
        "verb_position": "Verb in second position (V2 rule)"
    },
    "word_families": {
        "nouns": ["Morgen", ["Vormittag", "Tagesanfang", "Frühe"]],
        "verbs": ["aufstehen", ["erwachen", "sich erheben", "wach werden"]],
        "adjectives": []
    },
    "variations": [
        "Ich wache jeden Morgen um sieben Uhr auf.",
        "Jeden Morgen stehe ich um sieben auf.",
        "Um sieben Uhr morgens stehe ich auf.",
        "Ich erhebe mich täglich um sieben Uhr.",
        "Morgens um sieben stehe ich auf."
    ],
    "translation": "I get up every morning at seven o'clock.",
    "pronunciation_guide": "Ich [ɪç] stehe [ˈʃteːə] jeden [ˈjeːdn̩] Morgen [ˈmɔʁɡn̩]"
}"#;

pub fn analysis_prompt(sentence: &str) -> String {
    format!(
        "Analyze this German sentence: \"{}\"\n\n\
You must respond with ONLY a valid JSON object in this exact format:\n\
{}\n\n\
Respond with ONLY the JSON object, no other text.",
        sentence, ANALYSIS_EXAMPLE
    )
}
