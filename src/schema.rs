//! Structural validation of decoded provider payloads.
//!
//! A payload is accepted wholesale or rejected wholesale: a single bad item
//! fails the whole call and no partial sequence is ever produced. Answer
//! matching is exact byte equality, so a provider that drifts from the
//! "correctAnswer is one of options" contract is caught here instead of
//! silently scoring wrong.

use crate::error::ValidationError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Index;
use std::sync::Arc;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Quiz Question", description = "A multiple-choice question with its correct answer")]
pub struct QuestionRecord {
    /// The question shown to the user
    #[serde(rename = "question", alias = "questionText")]
    pub question_text: String,
    /// Answer options; the correct answer is one of them
    #[schemars(length(min = 2))]
    pub options: Vec<String>,
    /// Must exactly match one entry of `options`
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

impl QuestionRecord {
    /// Build a record, enforcing the same invariants as `validate`.
    pub fn new(
        question_text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let record = Self {
            question_text: question_text.into(),
            options,
            correct_answer: correct_answer.into(),
        };
        record.check().map_err(ValidationError::new)?;
        Ok(record)
    }

    pub fn has_option(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }

    fn check(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!("expected at least 2 options, got {}", self.options.len()));
        }
        if !self.has_option(&self.correct_answer) {
            return Err(format!("correct answer '{}' is not one of the options", self.correct_answer));
        }
        Ok(())
    }

    fn from_value(index: usize, raw: &Value) -> Result<Self, ValidationError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ValidationError::at(index, "expected an object"))?;

        let question_text = ["question", "questionText"]
            .iter()
            .find_map(|key| obj.get(*key))
            .ok_or_else(|| ValidationError::at(index, "missing field 'question'"))?
            .as_str()
            .ok_or_else(|| ValidationError::at(index, "field 'question' must be a string"))?
            .to_string();

        let options = required(obj, "options", index)?
            .as_array()
            .ok_or_else(|| ValidationError::at(index, "field 'options' must be an array"))?
            .iter()
            .enumerate()
            .map(|(i, o)| {
                o.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::at(index, format!("option {} must be a string", i)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let correct_answer = required(obj, "correctAnswer", index)?
            .as_str()
            .ok_or_else(|| ValidationError::at(index, "field 'correctAnswer' must be a string"))?
            .to_string();

        let record = Self { question_text, options, correct_answer };
        record.check().map_err(|reason| ValidationError::at(index, reason))?;
        Ok(record)
    }
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, index: usize) -> Result<&'a Value, ValidationError> {
    obj.get(key)
        .ok_or_else(|| ValidationError::at(index, format!("missing field '{}'", key)))
}

/// Ordered, immutable, non-empty list of validated questions.
///
/// Cloning is cheap and shares the underlying buffer, so a session reset
/// keeps the very same questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSequence {
    questions: Arc<[QuestionRecord]>,
}

impl QuestionSequence {
    /// Wrap already-built records (e.g. a quiz loaded from the quiz store).
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, ValidationError> {
        if questions.is_empty() {
            return Err(ValidationError::new("question list is empty"));
        }
        for (i, q) in questions.iter().enumerate() {
            q.check().map_err(|reason| ValidationError::at(i, reason))?;
        }
        Ok(Self { questions: questions.into() })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuestionRecord> {
        self.questions.iter()
    }

    /// True when both sequences share the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.questions, &other.questions)
    }
}

impl Index<usize> for QuestionSequence {
    type Output = QuestionRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.questions[index]
    }
}

impl<'a> IntoIterator for &'a QuestionSequence {
    type Item = &'a QuestionRecord;
    type IntoIter = std::slice::Iter<'a, QuestionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Validate a decoded payload as a question sequence.
pub fn validate(raw: &Value) -> Result<QuestionSequence, ValidationError> {
    let items = raw
        .as_array()
        .ok_or_else(|| ValidationError::new("expected a JSON array of questions"))?;
    if items.is_empty() {
        return Err(ValidationError::new("question list is empty"));
    }

    let questions = items
        .iter()
        .enumerate()
        .map(|(i, item)| QuestionRecord::from_value(i, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuestionSequence { questions: questions.into() })
}

/// Like [`validate`], but also requires exactly `expected` questions.
pub fn validate_count(raw: &Value, expected: usize) -> Result<QuestionSequence, ValidationError> {
    let sequence = validate(raw)?;
    if sequence.len() != expected {
        return Err(ValidationError::new(format!(
            "expected {} questions, got {}",
            expected,
            sequence.len()
        )));
    }
    Ok(sequence)
}

/// Similarity report returned by the plagiarism check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Plagiarism Report", description = "Similarity between two texts")]
pub struct PlagiarismReport {
    /// Percentage of similarity
    #[schemars(range(min = 0, max = 100))]
    pub score: f64,
    /// Sentences from the checked text that resemble the source text
    #[serde(rename = "similarSentences")]
    pub similar_sentences: Vec<String>,
}

impl PlagiarismReport {
    pub const HIGH_SIMILARITY_THRESHOLD: f64 = 50.0;

    pub fn is_high_similarity(&self) -> bool {
        self.score > Self::HIGH_SIMILARITY_THRESHOLD
    }
}

/// A payload shape that can be checked after the inner JSON is decoded.
pub trait ResponseSchema: Sized {
    fn validate(raw: &Value) -> Result<Self, ValidationError>;
}

impl ResponseSchema for QuestionSequence {
    fn validate(raw: &Value) -> Result<Self, ValidationError> {
        validate(raw)
    }
}

impl ResponseSchema for PlagiarismReport {
    fn validate(raw: &Value) -> Result<Self, ValidationError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ValidationError::new("expected a JSON object"))?;

        let score = obj
            .get("score")
            .ok_or_else(|| ValidationError::new("missing field 'score'"))?
            .as_f64()
            .ok_or_else(|| ValidationError::new("field 'score' must be a number"))?;
        if !(0.0..=100.0).contains(&score) {
            return Err(ValidationError::new(format!("score {} is outside 0..=100", score)));
        }

        let similar_sentences = obj
            .get("similarSentences")
            .ok_or_else(|| ValidationError::new("missing field 'similarSentences'"))?
            .as_array()
            .ok_or_else(|| ValidationError::new("field 'similarSentences' must be an array"))?
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::at(i, "similar sentence must be a string"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { score, similar_sentences })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(text: &str, answer: &str) -> Value {
        json!({ "question": text, "options": ["A", "B", "C", "D"], "correctAnswer": answer })
    }

    #[test]
    fn accepts_well_formed_array() {
        let raw = json!([question("Q1", "A"), question("Q2", "D")]);
        let seq = validate(&raw).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[1].correct_answer, "D");
        assert!(seq.iter().all(|q| q.has_option(&q.correct_answer)));
    }

    #[test]
    fn accepts_question_text_key() {
        let raw = json!([{ "questionText": "Capital?", "options": ["Paris", "Rome"], "correctAnswer": "Paris" }]);
        let seq = validate(&raw).unwrap();
        assert_eq!(seq[0].question_text, "Capital?");
    }

    #[test]
    fn rejects_empty_array() {
        let err = validate(&json!([])).unwrap_err();
        assert_eq!(err.index, None);
    }

    #[test]
    fn rejects_non_array() {
        assert!(validate(&json!({ "question": "Q" })).is_err());
    }

    #[test]
    fn rejects_missing_field_with_index() {
        let raw = json!([question("Q1", "A"), { "question": "Q2", "options": ["A", "B"] }]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.index, Some(1));
        assert!(err.reason.contains("correctAnswer"));
    }

    #[test]
    fn answer_match_is_exact() {
        let raw = json!([{ "question": "Q", "options": ["Paris", "Rome"], "correctAnswer": "paris " }]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.index, Some(0));
    }

    #[test]
    fn rejects_single_option() {
        let raw = json!([{ "question": "Q", "options": ["A"], "correctAnswer": "A" }]);
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn rejects_blank_question() {
        let raw = json!([question("   ", "A")]);
        assert!(validate(&raw).is_err());
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let raw = json!([question("Q1", "A"), question("Q2", "B")]);
        assert!(validate_count(&raw, 2).is_ok());
        assert!(validate_count(&raw, 3).is_err());
    }

    #[test]
    fn plagiarism_report_bounds() {
        let ok = json!({ "score": 72.5, "similarSentences": ["The sky is blue."] });
        let report = PlagiarismReport::validate(&ok).unwrap();
        assert!(report.is_high_similarity());

        let out_of_range = json!({ "score": 140, "similarSentences": [] });
        assert!(PlagiarismReport::validate(&out_of_range).is_err());

        let bad_sentence = json!({ "score": 10, "similarSentences": [3] });
        assert!(PlagiarismReport::validate(&bad_sentence).is_err());
    }
}
