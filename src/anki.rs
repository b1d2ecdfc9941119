use serde::{Deserialize, Serialize};

use crate::audio::audio_filename;
use crate::error::{AppError, Result};

/// How many variations go on the back of a card.
pub const MAX_VARIATIONS: usize = 3;

/// The parts of an analysis a card needs. Anything missing renders empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardAnalysis {
    #[serde(default)]
    pub grammar: Option<CardGrammar>,
    #[serde(default)]
    pub variations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardGrammar {
    #[serde(default)]
    pub structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashcardRecord {
    pub front: String,
    pub back: String,
    pub audio: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnkiExport {
    pub card: FlashcardRecord,
    pub csv_line: String,
}

pub fn export(sentence: &str, translation: &str, analysis: &CardAnalysis) -> Result<AnkiExport> {
    if sentence.is_empty() {
        return Err(AppError::invalid("No sentence provided"));
    }

    let structure = analysis
        .grammar
        .as_ref()
        .and_then(|g| g.structure.as_deref())
        .unwrap_or("");
    let variations = analysis
        .variations
        .as_deref()
        .map(|v| {
            v.iter()
                .take(MAX_VARIATIONS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();

    let card = FlashcardRecord {
        front: sentence.to_string(),
        back: format!(
            "{}<br><br><strong>Grammar:</strong> {}<br><strong>Variations:</strong> {}",
            translation, structure, variations
        ),
        audio: audio_filename(sentence),
    };
    let csv_line = csv_record(&[&card.front, &card.back, &card.audio])
        .map_err(|e| AppError::upstream("Export failed", e))?;

    Ok(AnkiExport { card, csv_line })
}

/// One fully quoted CSV record, without the line terminator.
fn csv_record(fields: &[&str]) -> std::result::Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let line = String::from_utf8_lossy(&bytes);
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
