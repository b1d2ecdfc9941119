//! Structured linguistic analysis of a generated sentence.
//!
//! The model is asked for a JSON object of one exact shape. Whatever comes
//! back is either decoded strictly into [`SentenceAnalysis`] or replaced as a
//! whole by [`SentenceAnalysis::fallback`]; nothing in between is ever
//! returned.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("static regex");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    pub tense: String,
    pub mood: String,
    pub clause_type: String,
    pub structure: String,
    pub verb_position: String,
}

/// `[headword, [synonym, ...]]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFamily(pub String, pub Vec<String>);

impl WordFamily {
    pub fn headword(&self) -> &str {
        &self.0
    }

    pub fn synonyms(&self) -> &[String] {
        &self.1
    }
}

/// Each slot is a family or `[]` when the sentence has no word of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFamilies {
    #[serde(with = "family_slot")]
    pub nouns: Option<WordFamily>,
    #[serde(with = "family_slot")]
    pub verbs: Option<WordFamily>,
    #[serde(with = "family_slot")]
    pub adjectives: Option<WordFamily>,
}

mod family_slot {
    use super::WordFamily;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Slot {
        Family(WordFamily),
        // only matches `[]`
        Empty([(); 0]),
    }

    pub fn serialize<S: Serializer>(
        slot: &Option<WordFamily>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match slot {
            Some(family) => family.serialize(serializer),
            None => serializer.collect_seq(std::iter::empty::<()>()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<WordFamily>, D::Error> {
        Ok(match Slot::deserialize(deserializer)? {
            Slot::Family(family) => Some(family),
            Slot::Empty(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnalysis {
    pub grammar: Grammar,
    pub word_families: WordFamilies,
    pub variations: Vec<String>,
    pub translation: String,
    pub pronunciation_guide: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl SentenceAnalysis {
    /// Filler record substituted whenever the model output cannot be decoded.
    pub fn fallback() -> Self {
        Self {
            grammar: Grammar {
                tense: "Present".to_string(),
                mood: "Indicative".to_string(),
                clause_type: "Main clause".to_string(),
                structure: "Standard German sentence structure".to_string(),
                verb_position: "Verb in second position".to_string(),
            },
            word_families: WordFamilies {
                nouns: Some(WordFamily(
                    "Wort".to_string(),
                    strings(&["Begriff", "Ausdruck", "Bezeichnung"]),
                )),
                verbs: Some(WordFamily(
                    "sein".to_string(),
                    strings(&["werden", "bleiben", "existieren"]),
                )),
                adjectives: Some(WordFamily(
                    "gut".to_string(),
                    strings(&["schön", "toll", "prima"]),
                )),
            },
            variations: strings(&[
                "Alternative sentence structure 1",
                "Alternative sentence structure 2",
                "Alternative sentence structure 3",
            ]),
            translation: "English translation of the sentence".to_string(),
            pronunciation_guide: "Pronunciation guide available".to_string(),
        }
    }

    /// Strict decode of a model reply, tolerating a surrounding code fence.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_code_fence(raw))
    }

    /// Decode or substitute [`SentenceAnalysis::fallback`] wholesale.
    pub fn parse_or_fallback(raw: &str) -> Self {
        log::debug!("Raw analysis response: {}", raw);
        match Self::parse(raw) {
            Ok(analysis) => {
                log::debug!("Parsed analysis: {:?}", analysis);
                analysis
            }
            Err(e) => {
                log::warn!("Analysis JSON rejected ({}), using fallback. Raw content: {}", e, raw);
                Self::fallback()
            }
        }
    }
}

/// Removes a Markdown code fence (```` ``` ```` or ```` ```json ````) around the text.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}
