//! Extraction of sub-score records from raw assessor replies.
//!
//! Assessors are told to answer with bare JSON, but instruction-following
//! models routinely wrap the object in a markdown fence or add a sentence
//! before or after it. [`extract_json_slice`] undoes exactly those two
//! deviations and nothing else; whatever it returns still has to decode
//! cleanly.

use crate::error::ParseError;
use crate::models::SubScoreRecord;
use serde_json::Value;

const FENCE: &str = "```";

/// Parse a raw reply into a validated [`SubScoreRecord`].
pub fn parse(raw: &str) -> Result<SubScoreRecord, ParseError> {
    let slice = extract_json_slice(raw)?;
    let value: Value = serde_json::from_str(slice).map_err(ParseError::Decode)?;
    SubScoreRecord::from_value(value)
}

/// Locate the JSON object text inside a raw reply.
pub fn extract_json_slice(raw: &str) -> Result<&str, ParseError> {
    let mut text = raw.trim();

    if text.starts_with(FENCE) {
        // The opening fence line may carry a language tag (```json).
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        if let Some(body) = text.trim_end().strip_suffix(FENCE) {
            text = body.trim();
        }
    }

    if text.starts_with('{') {
        return Ok(text);
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(ParseError::NoJsonObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = include_str!("../../fixtures/responses/market_plain.json");

    #[test]
    fn test_parse_plain_object() {
        let record = parse(RECORD).unwrap();
        assert_eq!(record.subscore(), 80.0);
        assert_eq!(record.flags(), ["LOW_FLOAT"]);
        assert_eq!(record.explanation(), "Market looks stable.");
    }

    #[test]
    fn test_fenced_matches_unfenced() {
        let expected = parse(RECORD).unwrap();

        for wrapped in [
            format!("```json\n{}\n```", RECORD),
            format!("   \n```\n{}```  \n\n", RECORD),
            format!("\t```JSON\n\n{}\n\n```\n", RECORD.trim()),
        ] {
            assert_eq!(parse(&wrapped).unwrap(), expected, "input: {:?}", wrapped);
        }
    }

    #[test]
    fn test_fence_without_closing_marker() {
        let expected = parse(RECORD).unwrap();
        let text = format!("```json\n{}", RECORD);
        assert_eq!(parse(&text).unwrap(), expected);
    }

    #[test]
    fn test_surrounding_prose_is_stripped() {
        let expected = parse(RECORD).unwrap();
        let text = format!(
            "Here is the assessment you asked for:\n{}\nLet me know if you need more.",
            RECORD
        );
        assert_eq!(parse(&text).unwrap(), expected);
    }

    #[test]
    fn test_fenced_with_prose_inside() {
        let text = include_str!("../../fixtures/responses/onchain_fenced_prose.txt");
        let record = parse(text).unwrap();
        assert_eq!(record.subscore(), 82.0);
        assert_eq!(record.details()["holder_check"], "passed");
    }

    #[test]
    fn test_no_braces_is_an_error() {
        assert!(matches!(parse("not json"), Err(ParseError::NoJsonObject)));
        assert!(matches!(parse(""), Err(ParseError::NoJsonObject)));
        assert!(matches!(parse("```"), Err(ParseError::NoJsonObject)));
        assert!(matches!(parse("} backwards {"), Err(ParseError::NoJsonObject)));
    }

    #[test]
    fn test_truncated_object_is_a_decode_error() {
        let text = r#"Result: {"subscore": 70, "confidence": 0.6, "flags": ["#;
        // Only an opening brace: nothing to slice.
        assert!(matches!(parse(text), Err(ParseError::NoJsonObject)));

        let text = r#"{"subscore": 70, "confidence": "#;
        assert!(matches!(parse(text), Err(ParseError::Decode(_))));
    }

    #[test]
    fn test_two_objects_are_not_merged() {
        let text = r#"first {"subscore": 1} then {"subscore": 2} done"#;
        assert!(matches!(parse(text), Err(ParseError::Decode(_))));
    }

    #[test]
    fn test_non_object_json() {
        assert!(matches!(
            parse("[1, 2, 3]"),
            Err(ParseError::NoJsonObject)
        ));
        assert!(matches!(
            parse(r#"{"subscore": 101}"#),
            Err(ParseError::Shape(_))
        ));
    }
}
