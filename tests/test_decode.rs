use atimelogger::decode::{decode_response, is_falsy, map_objects, strip_spurious_key};
use serde_json::{json, Value};

#[test]
fn decode_strips_a_falsy_empty_string_key() {
    let map = decode_response(r#"{"": false, "intervals": []}"#).unwrap();
    assert!(!map.contains_key(""));
    assert!(map.contains_key("intervals"));
}

#[test]
fn decode_preserves_a_truthy_empty_string_key() {
    let map = decode_response(r#"{"": true, "intervals": []}"#).unwrap();
    assert_eq!(map.get(""), Some(&json!(true)));
}

#[test]
fn decode_rejects_non_object_bodies() {
    assert!(decode_response("[1, 2, 3]").is_err());
    assert!(decode_response("not json at all").is_err());
}

#[test]
fn strip_only_touches_the_empty_string_key() {
    let Value::Object(mut map) = json!({"": 0, "zero": 0}) else {
        unreachable!()
    };
    strip_spurious_key(&mut map);
    assert!(!map.contains_key(""));
    assert_eq!(map.get("zero"), Some(&json!(0)));
}

#[test]
fn map_objects_applies_a_caller_hook_to_every_object() {
    let mut value = json!({
        "intervals": [{"a": 1}, {"b": 2}],
        "meta": {"nested": {"c": 3}}
    });
    let mut visited = 0;
    map_objects(&mut value, &mut |record| {
        visited += 1;
        record.insert("seen".to_string(), json!(true));
    });

    // two interval records, meta, meta.nested, and the envelope itself
    assert_eq!(visited, 5);
    assert_eq!(value["intervals"][0]["seen"], json!(true));
    assert_eq!(value["meta"]["nested"]["seen"], json!(true));
    assert_eq!(value["seen"], json!(true));
}

#[test]
fn falsy_matches_python_truthiness_for_json_values() {
    assert!(is_falsy(&json!(null)));
    assert!(is_falsy(&json!(0.0)));
    assert!(!is_falsy(&json!(-1)));
    assert!(!is_falsy(&json!("0")));
}
