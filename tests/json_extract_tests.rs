use quiz_engine::json_utils::{extract_json_payload, find_json_structures, NodeType};

#[test]
fn bare_json_is_returned_trimmed() {
    assert_eq!(extract_json_payload("  [1, 2]\n"), Some("[1, 2]"));
}

#[test]
fn fenced_json_is_found() {
    let text = "Here is your quiz:\n```json\n[{\"question\":\"Q\"}]\n```\nEnjoy!";
    assert_eq!(extract_json_payload(text), Some("[{\"question\":\"Q\"}]"));
}

#[test]
fn braces_inside_strings_are_ignored() {
    let text = r#"note {"question":"What does } mean?","options":["{","}"]} end"#;
    let roots = find_json_structures(text);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].kind, NodeType::Object);
    assert!(roots[0].slice(text).ends_with("]}"));
}

#[test]
fn prose_only_has_no_payload() {
    assert_eq!(extract_json_payload("Sorry, I can't do that."), None);
    assert_eq!(extract_json_payload("unbalanced { [ }"), None);
}

#[test]
fn first_parsable_structure_wins() {
    let text = "draft {not json} final {\"score\": 3, \"similarSentences\": []}";
    assert_eq!(extract_json_payload(text), Some("{\"score\": 3, \"similarSentences\": []}"));
}
