use tracing::{debug, instrument};

/// Type of a JSON node found by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Byte span of a balanced JSON object/array within a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjCoords {
    pub start: usize,
    pub end: usize, // inclusive index of the closing bracket/brace
    pub kind: NodeType,
}

impl ObjCoords {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

/// Find all root-level JSON object/array spans in `text`, skipping string contents.
#[instrument(target = "quiz_engine::json", skip(text))]
pub fn find_json_structures(text: &str) -> Vec<ObjCoords> {
    let mut results = Vec::new();
    let mut stack: Vec<(usize, NodeType)> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' => {
                // Strings only matter inside a structure.
                if !stack.is_empty() {
                    in_string = true;
                }
                continue;
            }
            b'{' => {
                stack.push((i, NodeType::Object));
                continue;
            }
            b'[' => {
                stack.push((i, NodeType::Array));
                continue;
            }
            b'}' => NodeType::Object,
            b']' => NodeType::Array,
            _ => continue,
        };

        match stack.pop() {
            Some((start, kind)) if kind == closing => {
                if stack.is_empty() {
                    results.push(ObjCoords { start, end: i, kind });
                }
            }
            // Unbalanced: drop whatever was open.
            Some(_) => stack.clear(),
            None => {}
        }
    }

    debug!(target = "quiz_engine::json", count = results.len(), "found root structures");
    results
}

/// The JSON document carried by model output text.
///
/// Bare JSON is returned as-is; otherwise the first root structure that parses
/// (e.g. inside a ```json fence) is used.
pub fn extract_json_payload(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed);
    }
    find_json_structures(text)
        .into_iter()
        .map(|node| node.slice(text))
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
}
