//! Study pack generation: prompt construction, the provider call with its
//! rate-limit retry policy, and validation of the model's JSON.

use std::time::Duration;

use studybuddy_core::config::LlmConfig;
use studybuddy_core::{QuestionCount, StudyPack};
use tracing::{debug, info, warn};

use crate::provider::{LlmError, LlmProvider, Message, ResponseFormat};

/// Hard ceiling on the course material sent to the model, in characters.
pub const MAX_TEXT_CHARS: usize = 16_000;

/// Low temperature keeps the output close to deterministic.
pub const TEMPERATURE: f32 = 0.3;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(1200);
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error("LLM provider rate limited the request ({attempts} attempts): {last}")]
    RateLimited { attempts: u32, last: LlmError },
    #[error("LLM error: {0}")]
    Provider(LlmError),
    #[error("LLM provider did not respond within {0:?}")]
    Timeout(Duration),
    #[error("malformed study pack from model: {reason}")]
    MalformedResponse { reason: String, raw_response: String },
}

/// Trim and truncate course material to `MAX_TEXT_CHARS` characters.
pub fn clamp_text(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_TEXT_CHARS) {
        Some((byte_idx, _)) => &trimmed[..byte_idx],
        None => trimmed,
    }
}

/// Turns course material into a [`StudyPack`] via an injected provider.
pub struct StudyPackGenerator {
    provider: Box<dyn LlmProvider>,
    max_tokens: u32,
    timeout: Duration,
}

impl StudyPackGenerator {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from config, creating the OpenAI provider.
    pub fn from_config(llm_config: &LlmConfig) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config)?;
        Ok(Self::new(provider)
            .with_max_tokens(llm_config.max_tokens)
            .with_timeout(llm_config.timeout()))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Generate a study pack. The quiz length is requested, not guaranteed.
    pub async fn generate(
        &self,
        text: &str,
        question_count: QuestionCount,
    ) -> Result<StudyPack, StudyError> {
        let material = clamp_text(text);
        let messages = vec![
            Message::system(system_prompt(question_count)),
            Message::user(user_prompt(material)),
        ];

        info!(
            "Generating study pack ({} chars, {} questions, model {})",
            material.chars().count(),
            question_count,
            self.provider.model()
        );

        let response = self.complete_with_retry(messages).await?;
        debug!("LLM response: {}", response);

        parse_study_pack(&response)
    }

    /// Call the provider, retrying only on rate limiting. Sleeps
    /// `attempt × 1.2s` between attempts.
    async fn complete_with_retry(&self, messages: Vec<Message>) -> Result<String, StudyError> {
        let mut attempt = 1;
        loop {
            let call = self.provider.complete(
                messages.clone(),
                TEMPERATURE,
                self.max_tokens,
                ResponseFormat::JsonObject,
            );

            match tokio::time::timeout(self.timeout, call).await {
                Err(_) => return Err(StudyError::Timeout(self.timeout)),
                Ok(Ok(content)) => return Ok(content),
                Ok(Err(e)) if e.is_rate_limited() => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(StudyError::RateLimited { attempts: attempt, last: e });
                    }
                    let delay = BACKOFF_STEP * attempt;
                    warn!(
                        "Rate limited on attempt {}/{}, retrying in {:?}",
                        attempt, MAX_ATTEMPTS, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(Err(e)) => return Err(StudyError::Provider(e)),
            }
        }
    }
}

fn system_prompt(question_count: QuestionCount) -> String {
    format!(
        "You are StudyBuddy, a friendly study assistant that breaks down complex topics \
         into easily understandable pieces. Given course material, produce: \
         (1) a tight summary (100-300 words), (2) 5-20 bullet key points, \
         (3) {question_count} MCQs with exactly 4 options each and a correct index (0..3), \
         (4) a short, actionable study plan (6-8 bullets). Return JSON only."
    )
}

fn user_prompt(material: &str) -> String {
    format!(
        "Course Material:\n\n{material}\n\n\
         Return strict JSON with keys: summary, keyPoints, quizQuestions, studyGuide. \
         For quizQuestions use: {{\"question\":\"...\",\"options\":[\"A\",\"B\",\"C\",\"D\"],\"correct\":0}}."
    )
}

fn parse_study_pack(response: &str) -> Result<StudyPack, StudyError> {
    let malformed = |reason: String| StudyError::MalformedResponse {
        reason,
        raw_response: response.to_string(),
    };

    let pack: StudyPack =
        serde_json::from_str(extract_json(response)).map_err(|e| malformed(e.to_string()))?;
    pack.validate().map_err(|e| malformed(e.to_string()))?;

    info!(
        "Study pack ready: {} key points, {} questions, {} plan steps",
        pack.key_points.len(),
        pack.quiz_questions.len(),
        pack.study_guide.len()
    );
    Ok(pack)
}

/// Extract JSON from an LLM response, handling markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    fn pack_json(questions: usize) -> String {
        let quiz: Vec<_> = (0..questions)
            .map(|i| {
                json!({
                    "question": format!("Question {i}?"),
                    "options": ["A", "B", "C", "D"],
                    "correct": i % 4,
                })
            })
            .collect();
        json!({
            "summary": "Plants turn light into chemical energy.",
            "keyPoints": ["Chlorophyll absorbs light", "Glucose is produced"],
            "quizQuestions": quiz,
            "studyGuide": ["Read chapter 3", "Draw the cycle"],
        })
        .to_string()
    }

    /// Replays a fixed script of responses and records every call.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<String, LlmError>>>,
        calls: Arc<AtomicU32>,
        seen: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl ScriptedProvider {
        fn new(mut script: Vec<Result<String, LlmError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Arc::new(AtomicU32::new(0)),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            temperature: f32,
            _max_tokens: u32,
            format: ResponseFormat,
        ) -> Result<String, LlmError> {
            assert_eq!(temperature, TEMPERATURE);
            assert_eq!(format, ResponseFormat::JsonObject);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(messages);
            self.script
                .lock()
                .unwrap()
                .pop()
                .expect("provider called more often than scripted")
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    /// Never answers.
    struct StalledProvider;

    #[async_trait]
    impl LlmProvider for StalledProvider {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
            _format: ResponseFormat,
        ) -> Result<String, LlmError> {
            std::future::pending().await
        }

        fn model(&self) -> &str {
            "stalled"
        }
    }

    fn rate_limited() -> Result<String, LlmError> {
        Err(LlmError::ApiError { status: 429, body: "Rate limit reached".into() })
    }

    #[test]
    fn clamp_text_trims_and_truncates_by_chars() {
        assert_eq!(clamp_text("  hello \n"), "hello");
        let long = "é".repeat(MAX_TEXT_CHARS + 10);
        let clamped = clamp_text(&long);
        assert_eq!(clamped.chars().count(), MAX_TEXT_CHARS);
        let exact = "x".repeat(MAX_TEXT_CHARS);
        assert_eq!(clamp_text(&exact).len(), MAX_TEXT_CHARS);
    }

    #[test]
    fn prompts_carry_count_and_material() {
        let system = system_prompt(QuestionCount::clamped(37));
        assert!(system.contains("20 MCQs"));
        assert!(system.contains("StudyBuddy"));
        let user = user_prompt("Photosynthesis converts light to energy.");
        assert!(user.starts_with("Course Material:\n\nPhotosynthesis"));
        assert!(user.contains("\"correct\":0"));
    }

    #[test]
    fn extract_json_code_block() {
        let input = "Here it is:\n```json\n{\"summary\": \"\"}\n```\nDone.";
        assert_eq!(extract_json(input), r#"{"summary": ""}"#);
        assert_eq!(extract_json("  {\"a\":1} "), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn returns_parsed_pack_on_first_success() {
        let provider = ScriptedProvider::new(vec![Ok(pack_json(5))]);
        let seen = provider.seen.clone();
        let generator = StudyPackGenerator::new(Box::new(provider));

        let pack = generator
            .generate("  Photosynthesis converts light to energy.  ", QuestionCount::default())
            .await
            .unwrap();
        assert_eq!(pack.quiz_questions.len(), 5);
        assert_eq!(pack.key_points.len(), 2);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0][0].content.contains("5 MCQs"));
        assert!(seen[0][1].content.contains("Material:\n\nPhotosynthesis converts light to energy.\n\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limit_with_linear_backoff() {
        let provider = ScriptedProvider::new(vec![rate_limited(), rate_limited(), Ok(pack_json(3))]);
        let calls = provider.calls.clone();
        let generator = StudyPackGenerator::new(Box::new(provider));

        let started = tokio::time::Instant::now();
        let pack = generator
            .generate("material", QuestionCount::clamped(3))
            .await
            .unwrap();

        assert_eq!(pack.quiz_questions.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(3600), "{:?}", started.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_propagate_rate_limit() {
        let provider = ScriptedProvider::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let calls = provider.calls.clone();
        let generator = StudyPackGenerator::new(Box::new(provider));

        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::RateLimited { attempts: 3, .. }), "{err}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_provider_errors_are_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(LlmError::ApiError {
            status: 401,
            body: "invalid api key".into(),
        })]);
        let calls = provider.calls.clone();
        let generator = StudyPackGenerator::new(Box::new(provider));

        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::Provider(LlmError::ApiError { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_json_output_is_malformed_not_empty() {
        let provider = ScriptedProvider::new(vec![Ok("Sorry, I can't help with that.".into())]);
        let generator = StudyPackGenerator::new(Box::new(provider));

        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();

        match err {
            StudyError::MalformedResponse { raw_response, .. } => {
                assert_eq!(raw_response, "Sorry, I can't help with that.");
            }
            other => panic!("expected MalformedResponse, got {other}"),
        }
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let bad = json!({
            "summary": "s",
            "keyPoints": [],
            "quizQuestions": [{ "question": "q", "options": ["A", "B", "C"], "correct": 0 }],
            "studyGuide": [],
        })
        .to_string();
        let provider = ScriptedProvider::new(vec![Ok(bad)]);
        let generator = StudyPackGenerator::new(Box::new(provider));

        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::MalformedResponse { .. }), "{err}");
        assert!(err.to_string().contains("expected 4 options"), "{err}");
    }

    #[tokio::test]
    async fn empty_object_is_malformed() {
        let provider = ScriptedProvider::new(vec![Ok("{}".into())]);
        let generator = StudyPackGenerator::new(Box::new(provider));
        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::MalformedResponse { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_times_out() {
        let generator = StudyPackGenerator::new(Box::new(StalledProvider))
            .with_timeout(Duration::from_secs(5));

        let err = generator
            .generate("material", QuestionCount::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::Timeout(d) if d == Duration::from_secs(5)), "{err}");
    }
}
