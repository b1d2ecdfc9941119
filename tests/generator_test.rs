use mockall::predicate::function;
use satzbau::analysis::SentenceAnalysis;
use satzbau::catalog::{ProficiencyLevel, TOPICS};
use satzbau::cortex::{CompletionProvider, CompletionRequest, CortexError};
use satzbau::error::AppError;
use satzbau::generator::{GenerationParams, SentenceGenerator};
use std::sync::Arc;

mockall::mock! {
    pub Provider {}
    #[async_trait::async_trait]
    impl CompletionProvider for Provider {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CortexError>;
    }
}

const SENTENCE: &str = "Ich stehe jeden Morgen um sieben Uhr auf und trinke Kaffee.";

const ANALYSIS: &str = r#"```json
{
    "grammar": {
        "tense": "present",
        "mood": "indicative",
        "clause_type": "main",
        "structure": "Subject + Verb + Time + Object",
        "verb_position": "V2"
    },
    "word_families": {
        "nouns": ["Morgen", ["Vormittag"]],
        "verbs": ["aufstehen", ["erwachen"]],
        "adjectives": []
    },
    "variations": ["Jeden Morgen stehe ich um sieben auf."],
    "translation": "I get up every morning at seven and drink coffee.",
    "pronunciation_guide": "Ich [ɪç]"
}
```"#;

fn is_sentence_call(req: &CompletionRequest) -> bool {
    req.prompt.starts_with("Generate a German sentence")
}

fn is_analysis_call(req: &CompletionRequest) -> bool {
    req.prompt.starts_with("Analyze this German sentence")
}

fn provider_replying(analysis: &'static str) -> MockProvider {
    let mut mock = MockProvider::new();
    mock.expect_complete()
        .with(function(is_sentence_call))
        .times(1)
        .returning(|_| Ok(format!("  {}\n", SENTENCE)));
    mock.expect_complete()
        .with(function(is_analysis_call))
        .times(1)
        .returning(move |_| Ok(analysis.to_string()));
    mock
}

fn generator(mock: MockProvider) -> SentenceGenerator {
    SentenceGenerator::new(Arc::new(mock), GenerationParams::default())
}

#[tokio::test]
async fn test_generate_returns_parsed_analysis() {
    let result = generator(provider_replying(ANALYSIS))
        .generate("A2", "Daily Routine")
        .await
        .unwrap();

    assert_eq!(result.sentence, SENTENCE);
    assert_eq!(result.level, "A2");
    assert_eq!(result.topic, "Daily Routine");
    assert_eq!(
        result.analysis.translation,
        "I get up every morning at seven and drink coffee."
    );
    assert!(result.analysis.word_families.adjectives.is_none());
}

#[tokio::test]
async fn test_generate_sends_bounds_and_sentence() {
    let mut mock = MockProvider::new();
    mock.expect_complete()
        .withf(|r| is_sentence_call(r) && r.max_tokens == 100 && (r.temperature - 0.7).abs() < 1e-6)
        .times(1)
        .returning(|_| Ok(SENTENCE.to_string()));
    mock.expect_complete()
        .withf(|r| {
            is_analysis_call(r)
                && r.prompt.contains(SENTENCE)
                && r.max_tokens == 1000
                && (r.temperature - 0.3).abs() < 1e-6
        })
        .times(1)
        .returning(|_| Ok(ANALYSIS.to_string()));

    assert!(generator(mock).generate("B1", "Food & Cooking").await.is_ok());
}

#[tokio::test]
async fn test_bad_analysis_uses_fallback() {
    let result = generator(provider_replying("Here is your analysis: grammar is fine."))
        .generate("C2", "Emotions & Feelings")
        .await
        .unwrap();
    assert_eq!(result.analysis, SentenceAnalysis::fallback());

    let value = serde_json::to_value(&result).unwrap();
    for key in ["grammar", "word_families", "variations", "translation", "pronunciation_guide"] {
        assert!(!value["analysis"][key].is_null());
    }
}

#[tokio::test]
async fn test_wrong_shape_uses_fallback() {
    let result = generator(provider_replying(r#"{"grammar": "present", "translation": "x"}"#))
        .generate("B2", "Work & Career")
        .await
        .unwrap();
    assert_eq!(result.analysis, SentenceAnalysis::fallback());
}

#[tokio::test]
async fn test_every_level_is_accepted() {
    for level in ProficiencyLevel::ALL {
        let result = generator(provider_replying(ANALYSIS))
            .generate(level.code(), TOPICS[3])
            .await;
        assert!(result.is_ok(), "level {} rejected", level.code());
    }
}

#[tokio::test]
async fn test_invalid_level_never_calls_provider() {
    // No expectations: any call panics.
    let err = generator(MockProvider::new())
        .generate("D1", "Daily Routine")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(ref m) if m == "Invalid language level"));
}

#[tokio::test]
async fn test_invalid_topic_rejected() {
    let err = generator(MockProvider::new())
        .generate("A1", "Quantum Physics")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(ref m) if m == "Invalid topic"));
}

#[tokio::test]
async fn test_sentence_call_failure_propagates() {
    let mut mock = MockProvider::new();
    mock.expect_complete()
        .times(1)
        .returning(|_| Err(CortexError::EmptyReply));

    let err = generator(mock).generate("A1", "Daily Routine").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamFailure(_)));
    assert_eq!(
        err.to_string(),
        "Failed to generate sentence: provider returned no content"
    );
}

#[tokio::test]
async fn test_blank_sentence_fails_before_analysis() {
    let mut mock = MockProvider::new();
    mock.expect_complete()
        .with(function(is_sentence_call))
        .times(1)
        .returning(|_| Ok(" \n ".to_string()));
    mock.expect_complete().with(function(is_analysis_call)).never();

    let err = generator(mock).generate("B2", "Travel & Transportation").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamFailure(_)));
    assert_eq!(
        err.to_string(),
        "Failed to generate sentence: provider returned no content"
    );
}
