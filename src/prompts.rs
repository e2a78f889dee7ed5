//! Prompt payloads sent through the transport.
//!
//! Structured payloads carry the instruction text with a JSON Schema hint
//! appended (so any text model can follow it) and a `generationConfig` that
//! asks schema-aware providers for JSON output directly. Free-text payloads
//! (summaries, tutor replies) carry only `contents`.

use crate::schema::{PlagiarismReport, QuestionRecord};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const OPTIONS_PER_QUESTION: usize = 4;

pub fn quiz_prompt(topic: &str, count: usize) -> String {
    format!(
        "Generate a {count}-question multiple-choice quiz on the topic of \"{topic}\". \
         For each question provide the question text, an array of exactly {OPTIONS_PER_QUESTION} options, \
         and the correct answer. The correct answer must be a string that exactly matches one of the options. \
         Respond with a JSON array of {count} objects and nothing else."
    )
}

pub fn plagiarism_prompt(my_text: &str, source_text: &str) -> String {
    format!(
        "You are a plagiarism detection tool. Compare the two texts below and respond with a JSON object containing:\n\
         1. \"score\": a number from 0 to 100, the percentage of similarity.\n\
         2. \"similarSentences\": an array of sentences from \"My Text\" that are similar to a sentence in \"Source Text\"; \
         empty if nothing is similar.\n\n\
         My Text: \"{my_text}\"\n\
         Source Text: \"{source_text}\""
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize the following text in a concise and clear manner:\n\n{text}")
}

pub fn tutor_prompt(question: &str) -> String {
    format!("You are an AI tutor. Provide a clear and helpful explanation for the following question: {question}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One earlier turn of a tutoring conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, text: text.into() }
    }

    fn content(&self) -> Value {
        json!({ "role": self.role, "parts": [ { "text": self.text } ] })
    }
}

/// Append JSON Schema guidance for `T` to a prompt.
pub fn add_schema_guidance<T: JsonSchema>(prompt: String) -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nReturn only valid JSON matching this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}

fn question_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswer": { "type": "STRING" }
            },
            "required": ["question", "options", "correctAnswer"],
            "propertyOrdering": ["question", "options", "correctAnswer"]
        }
    })
}

fn plagiarism_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER" },
            "similarSentences": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["score", "similarSentences"],
        "propertyOrdering": ["score", "similarSentences"]
    })
}

fn payload(prompt: String, response_schema: Value) -> Value {
    json!({
        "contents": [ { "parts": [ { "text": prompt } ] } ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema
        }
    })
}

pub fn quiz_payload(topic: &str, count: usize) -> Value {
    let prompt = add_schema_guidance::<Vec<QuestionRecord>>(quiz_prompt(topic, count));
    payload(prompt, question_response_schema())
}

pub fn plagiarism_payload(my_text: &str, source_text: &str) -> Value {
    let prompt = add_schema_guidance::<PlagiarismReport>(plagiarism_prompt(my_text, source_text));
    payload(prompt, plagiarism_response_schema())
}

pub fn summary_payload(text: &str) -> Value {
    json!({ "contents": [ { "parts": [ { "text": summary_prompt(text) } ] } ] })
}

/// Conversation so far, in order, followed by the new question as a user turn.
pub fn tutor_payload(history: &[ChatTurn], question: &str) -> Value {
    let mut contents: Vec<Value> = history.iter().map(ChatTurn::content).collect();
    contents.push(ChatTurn::user(tutor_prompt(question)).content());
    json!({ "contents": contents })
}

/// Instruction text of a payload built by this module: the text of its last
/// content entry.
pub fn prompt_text(payload: &Value) -> Option<&str> {
    payload
        .get("contents")?
        .as_array()?
        .last()?
        .pointer("/parts/0/text")
        .and_then(Value::as_str)
}
