//! Best-effort extraction of the JSON array from a model reply.
//!
//! Models are told to answer with a bare array but routinely wrap it in
//! prose or a ```json fence. The heuristic is deliberately simple: take
//! everything from the first `[` to the last `]` and hand it to serde_json.
//!
//! Limits of the heuristic:
//! - text outside that span is discarded without inspection;
//! - a reply holding two separate arrays yields a span such as
//!   `[..] and [..]`, which is not valid JSON and fails as
//!   [`ResponseParseError::InvalidJson`];
//! - a `[` inside prose before the real array has the same effect.

use crate::record::LabTestRecord;
use thiserror::Error;

/// Why a reply produced no records.
#[derive(Debug, Error)]
pub enum ResponseParseError {
    #[error("No JSON array found in response")]
    NoJsonArray,

    #[error("Failed to parse response as JSON: {0}")]
    InvalidJson(String),
}

/// Parse the records out of a raw model reply.
pub fn parse_model_response(text: &str) -> Result<Vec<LabTestRecord>, ResponseParseError> {
    let start = text.find('[').ok_or(ResponseParseError::NoJsonArray)?;
    let end = match text.rfind(']') {
        Some(i) if i > start => i,
        _ => {
            return Err(ResponseParseError::InvalidJson(
                "no closing ']' after the first '['".into(),
            ))
        }
    };

    serde_json::from_str(&text[start..=end])
        .map_err(|e| ResponseParseError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LabStatus;

    #[test]
    fn bare_array() {
        let recs = parse_model_response(r#"[{"test":"TSH","status":"normal"}]"#).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].status, Some(LabStatus::Normal));
    }

    #[test]
    fn array_surrounded_by_prose_and_fence() {
        let reply = "Here are the results:\n```json\n[\n  {\"test\": \"HDL\"},\n  {\"test\": \"LDL\"}\n]\n```\nLet me know if you need more.";
        let recs = parse_model_response(reply).unwrap();
        let names: Vec<_> = recs.iter().filter_map(|r| r.test.as_deref()).collect();
        assert_eq!(names, ["HDL", "LDL"]);
    }

    #[test]
    fn empty_array_is_success() {
        assert!(parse_model_response("[]").unwrap().is_empty());
    }

    #[test]
    fn no_bracket_fails() {
        assert!(matches!(
            parse_model_response("I could not find any lab results."),
            Err(ResponseParseError::NoJsonArray)
        ));
        assert!(matches!(
            parse_model_response(""),
            Err(ResponseParseError::NoJsonArray)
        ));
    }

    #[test]
    fn unclosed_array_fails_as_invalid_json() {
        assert!(matches!(
            parse_model_response(r#"[{"test": "TSH"}"#),
            Err(ResponseParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn closing_bracket_before_opening_fails() {
        assert!(matches!(
            parse_model_response("] then ["),
            Err(ResponseParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn two_arrays_fail_as_invalid_json() {
        let reply = r#"[{"test":"A"}] and also [{"test":"B"}]"#;
        assert!(matches!(
            parse_model_response(reply),
            Err(ResponseParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn array_of_non_objects_fails() {
        assert!(matches!(
            parse_model_response("[1, 2, 3]"),
            Err(ResponseParseError::InvalidJson(_))
        ));
    }
}
