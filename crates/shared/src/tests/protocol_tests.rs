use super::*;
use serde_json::json;

#[test]
fn decodes_flat_object_in_order() {
    let result = decode_extract_response(200, br#"{"full_name":"Jane Doe","dob":"1990-01-01"}"#)
        .expect("decode");
    let fields: Vec<(&str, &Value)> = result.iter().collect();
    assert_eq!(
        fields,
        vec![
            ("full_name", &json!("Jane Doe")),
            ("dob", &json!("1990-01-01")),
        ]
    );
}

#[test]
fn decodes_empty_object_as_empty_result() {
    let result = decode_extract_response(200, b"{}").expect("decode");
    assert!(result.is_empty());
}

#[test]
fn keeps_null_and_numeric_values() {
    let result = decode_extract_response(200, br#"{"pan":null,"pan_confidence":0.0}"#)
        .expect("decode");
    assert_eq!(result.get("pan"), Some(&Value::Null));
    assert_eq!(result.get("pan_confidence"), Some(&json!(0.0)));
}

#[test]
fn error_envelope_becomes_service_error() {
    let err = decode_extract_response(400, br#"{"error":"No file uploaded"}"#)
        .expect_err("must fail");
    assert_eq!(
        err,
        ExtractionError::Service {
            status: 400,
            message: "No file uploaded".to_string(),
        }
    );
}

#[test]
fn non_envelope_error_body_is_used_verbatim() {
    let err = decode_extract_response(502, b"  Bad Gateway \n").expect_err("must fail");
    assert_eq!(
        err,
        ExtractionError::Service {
            status: 502,
            message: "Bad Gateway".to_string(),
        }
    );
    assert!(err.is_transient());
}

#[test]
fn empty_error_body_is_reported() {
    let err = decode_extract_response(500, b"").expect_err("must fail");
    assert!(err.to_string().contains("empty response body"), "{err}");
}

#[test]
fn long_error_body_is_truncated() {
    let body = "x".repeat(1000);
    let err = decode_extract_response(500, body.as_bytes()).expect_err("must fail");
    match err {
        ExtractionError::Service { message, .. } => {
            assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 1);
            assert!(message.ends_with('…'));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn array_body_is_a_parse_error() {
    let err = decode_extract_response(200, br#"["a","b"]"#).expect_err("must fail");
    match err {
        ExtractionError::Parse(message) => assert!(message.contains("an array"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_body_is_a_parse_error() {
    let err = decode_extract_response(200, b"<html>oops</html>").expect_err("must fail");
    assert!(matches!(err, ExtractionError::Parse(_)));
    assert!(!err.is_transient());
}
