//! Provider response envelope:
//! `{ candidates: [ { content: { parts: [ { text } ] } } ] }`.
//!
//! The `text` of the first part carries the model output, which is itself a
//! JSON document encoded as a string.

use crate::error::EnvelopeError;
use crate::json_utils::extract_json_payload;
use crate::transport::ResponseBody;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: String,
}

impl GenerateContentResponse {
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
    }
}

/// Text of the first candidate part, exactly as the model produced it.
pub fn candidate_text(body: &ResponseBody) -> Result<String, EnvelopeError> {
    let value = match body {
        ResponseBody::Json(v) => v,
        ResponseBody::Text(_) => return Err(EnvelopeError::NotJson),
    };

    let envelope = GenerateContentResponse::deserialize(value)
        .map_err(|e| EnvelopeError::BadShape(e.to_string()))?;
    envelope
        .first_text()
        .map(str::to_string)
        .ok_or(EnvelopeError::NoText)
}

/// Unwrap the envelope and decode the embedded JSON document.
pub fn decode_inner(body: &ResponseBody) -> Result<Value, EnvelopeError> {
    let text = candidate_text(body)?;
    let payload = extract_json_payload(&text)
        .ok_or_else(|| EnvelopeError::InnerNotJson(truncate(&text, 120)))?;
    serde_json::from_str(payload).map_err(|e| EnvelopeError::InnerNotJson(e.to_string()))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(text: &str) -> ResponseBody {
        ResponseBody::Json(json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] }))
    }

    #[test]
    fn decodes_inner_array() {
        let inner = decode_inner(&envelope(r#"[{"a":1}]"#)).unwrap();
        assert_eq!(inner, json!([{ "a": 1 }]));
    }

    #[test]
    fn decodes_fenced_inner_json() {
        let inner = decode_inner(&envelope("```json\n{\"score\": 12, \"similarSentences\": []}\n```")).unwrap();
        assert_eq!(inner["score"], 12);
    }

    #[test]
    fn text_body_is_not_an_envelope() {
        assert_eq!(decode_inner(&ResponseBody::Text("<html>".into())), Err(EnvelopeError::NotJson));
    }

    #[test]
    fn missing_candidates() {
        let err = decode_inner(&ResponseBody::Json(json!({ "error": "nope" }))).unwrap_err();
        assert!(matches!(err, EnvelopeError::BadShape(_)));
        assert_eq!(decode_inner(&ResponseBody::Json(json!({ "candidates": [] }))), Err(EnvelopeError::NoText));
    }

    #[test]
    fn candidate_text_is_returned_verbatim() {
        assert_eq!(candidate_text(&envelope("  A short summary.\n")).unwrap(), "  A short summary.\n");
        assert_eq!(candidate_text(&ResponseBody::Text("plain".into())), Err(EnvelopeError::NotJson));
    }

    #[test]
    fn inner_text_without_json() {
        let err = decode_inner(&envelope("I cannot help with that.")).unwrap_err();
        assert!(matches!(err, EnvelopeError::InnerNotJson(_)));
    }
}
