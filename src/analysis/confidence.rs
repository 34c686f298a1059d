//! Confidence normalization.
//!
//! Assessors report confidence as a fraction, a percentage, a numeric
//! string, a boolean, or not at all. Confidence is advisory, so every
//! representation maps to a value in [0, 1] and a bad one falls back to a
//! default instead of failing the run.

use serde_json::Value;
use tracing::debug;

/// Confidence assumed when an assessor gives none or an unusable one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Map any confidence representation into [0, 1].
///
/// Values above 1 are read as percentages. The result is always finite.
pub fn normalize(raw: Option<&Value>, default: f64) -> f64 {
    let value = coerce(raw).unwrap_or(default);
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}

fn coerce(raw: Option<&Value>) -> Option<f64> {
    let value = match raw? {
        Value::Null => return None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if !v.is_nan() => Some(v),
        _ => {
            debug!("Confidence {:?} could not be coerced, using default", raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(value: Value) -> f64 {
        normalize(Some(&value), DEFAULT_CONFIDENCE)
    }

    #[test]
    fn test_absent_uses_default() {
        assert_eq!(normalize(None, DEFAULT_CONFIDENCE), 0.5);
        assert_eq!(norm(Value::Null), 0.5);
        assert_eq!(normalize(None, 0.3), 0.3);
    }

    #[test]
    fn test_fractions_pass_through() {
        assert_eq!(norm(json!(0.9)), 0.9);
        assert_eq!(norm(json!("0.9")), 0.9);
        assert_eq!(norm(json!("  0.25\n")), 0.25);
        assert_eq!(norm(json!(1)), 1.0);
        assert_eq!(norm(json!(0)), 0.0);
    }

    #[test]
    fn test_percentages_are_scaled() {
        assert_eq!(norm(json!(85)), 0.85);
        assert_eq!(norm(json!("83")), 0.83);
        assert_eq!(norm(json!(100)), 1.0);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(norm(json!(150)), 1.0);
        assert_eq!(norm(json!(-10)), 0.0);
        assert_eq!(norm(json!(-5)), 0.0);
        assert_eq!(norm(json!("inf")), 1.0);
        assert_eq!(norm(json!("-inf")), 0.0);
    }

    #[test]
    fn test_garbage_uses_default() {
        assert_eq!(norm(json!("high")), 0.5);
        assert_eq!(norm(json!("")), 0.5);
        assert_eq!(norm(json!("NaN")), 0.5);
        assert_eq!(norm(json!([0.9])), 0.5);
        assert_eq!(norm(json!({"value": 0.9})), 0.5);
    }

    #[test]
    fn test_booleans_coerce_numerically() {
        assert_eq!(norm(json!(true)), 1.0);
        assert_eq!(norm(json!(false)), 0.0);
    }

    #[test]
    fn test_always_in_unit_interval() {
        let inputs = [
            Value::Null,
            json!("83"),
            json!(83),
            json!(150),
            json!(-5),
            json!(1e308),
            json!(-1e308),
            json!("1e400"),
            json!(f64::MIN_POSITIVE),
        ];
        for input in inputs {
            let out = norm(input.clone());
            assert!(out.is_finite() && (0.0..=1.0).contains(&out), "{} -> {}", input, out);
        }
    }
}
