use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Options every quiz question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Structured output generated from a piece of course material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPack {
    pub summary: String,
    pub key_points: Vec<String>,
    pub quiz_questions: Vec<QuizQuestion>,
    pub study_guide: Vec<String>,
}

/// A four-option multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    #[serde(rename = "correct", alias = "correctIndex")]
    pub correct_index: u8,
}

impl StudyPack {
    /// Check the shape the prompt asks for. The number of questions is
    /// deliberately not checked: models routinely return more or fewer.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (i, q) in self.quiz_questions.iter().enumerate() {
            q.validate()
                .map_err(|reason| CoreError::InvalidStudyPack(format!("quizQuestions[{i}]: {reason}")))?;
        }
        Ok(())
    }
}

impl QuizQuestion {
    fn validate(&self) -> Result<(), String> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "expected {OPTIONS_PER_QUESTION} options, got {}",
                self.options.len()
            ));
        }
        if usize::from(self.correct_index) >= OPTIONS_PER_QUESTION {
            return Err(format!(
                "correct index {} out of range 0..={}",
                self.correct_index,
                OPTIONS_PER_QUESTION - 1
            ));
        }
        Ok(())
    }
}

// ── Question count ────────────────────────────────────────────

/// Number of quiz questions to request, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionCount(u8);

impl QuestionCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 20;
    pub const DEFAULT: u8 = 5;

    /// Clamp an arbitrary integer into range.
    pub fn clamped(n: i64) -> Self {
        // Bounds fit in u8, so the cast after clamping is lossless.
        Self(n.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Parse a raw form value. Absent or non-numeric input yields the default;
    /// numbers too large for `i64` still clamp to the nearest bound.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match raw.trim().parse::<i64>() {
            Ok(n) => Self::clamped(n),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Self(Self::MAX),
                IntErrorKind::NegOverflow => Self(Self::MIN),
                _ => Self::default(),
            },
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: usize, correct: u8) -> QuizQuestion {
        QuizQuestion {
            question: "What does photosynthesis produce?".into(),
            options: (0..options).map(|i| format!("option {i}")).collect(),
            correct_index: correct,
        }
    }

    #[test]
    fn question_count_clamps_and_defaults() {
        assert_eq!(QuestionCount::parse(None).get(), 5);
        assert_eq!(QuestionCount::parse(Some("abc")).get(), 5);
        assert_eq!(QuestionCount::parse(Some("")).get(), 5);
        assert_eq!(QuestionCount::parse(Some("-3")).get(), 1);
        assert_eq!(QuestionCount::parse(Some("0")).get(), 1);
        assert_eq!(QuestionCount::parse(Some("37")).get(), 20);
        assert_eq!(QuestionCount::parse(Some(" 12 ")).get(), 12);
        assert_eq!(QuestionCount::clamped(i64::MAX).get(), 20);
        assert_eq!(QuestionCount::parse(Some("99999999999999999999")).get(), 20);
        assert_eq!(QuestionCount::parse(Some("-99999999999999999999")).get(), 1);
        assert_eq!(QuestionCount::parse(Some("1e3")).get(), 5);
    }

    #[test]
    fn quiz_question_uses_correct_on_the_wire() {
        let json = serde_json::to_value(question(4, 2)).unwrap();
        assert_eq!(json["correct"], 2);
        assert!(json.get("correctIndex").is_none());

        let parsed: QuizQuestion = serde_json::from_str(
            r#"{"question":"q","options":["a","b","c","d"],"correctIndex":3}"#,
        )
        .unwrap();
        assert_eq!(parsed.correct_index, 3);
    }

    #[test]
    fn study_pack_serializes_camel_case() {
        let pack = StudyPack {
            summary: "s".into(),
            key_points: vec!["k".into()],
            quiz_questions: vec![],
            study_guide: vec!["g".into()],
        };
        let json = serde_json::to_value(&pack).unwrap();
        assert!(json.get("keyPoints").is_some());
        assert!(json.get("quizQuestions").is_some());
        assert!(json.get("studyGuide").is_some());
    }

    #[test]
    fn validate_rejects_wrong_option_count() {
        let pack = StudyPack {
            quiz_questions: vec![question(4, 0), question(3, 0)],
            ..Default::default()
        };
        let err = pack.validate().unwrap_err().to_string();
        assert!(err.contains("quizQuestions[1]"), "{err}");
        assert!(err.contains("expected 4 options, got 3"), "{err}");
    }

    #[test]
    fn validate_rejects_out_of_range_answer() {
        let pack = StudyPack {
            quiz_questions: vec![question(4, 4)],
            ..Default::default()
        };
        assert!(pack.validate().is_err());
        assert!(StudyPack::default().validate().is_ok());
    }
}
