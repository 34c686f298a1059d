//! Category-scoped prompt construction.
//!
//! Each assessor sees the entity identity and its own category's facts,
//! never another category's, so one assessor's data cannot colour another's
//! score.

use crate::models::{Category, InputContext};
use serde_json::{Map, Value};

/// The exact output contract every assessor must follow.
const OUTPUT_CONTRACT: &str = "Return ONLY a JSON object with EXACT keys:\n\
subscore (number 0-100), confidence (number between 0 and 1), flags (string array), \
explanation (string), details (object).\n\
No markdown. No code fences. No extra text.";

/// Build the request text for one category.
pub fn build_prompt(category: Category, context: &InputContext) -> String {
    let payload = scoped_payload(category, context);
    let payload = Value::Object(payload).to_string();

    let mut prompt = String::new();
    prompt.push_str("You are a scoring module.\n");
    prompt.push_str(&format!(
        "Compute ONLY the {} subscore (0-100).\n",
        category.title()
    ));
    prompt.push_str(&format!(
        "Use ONLY fields under {} (+ optional name/symbol/age_days).\n",
        category.as_str()
    ));
    if category == Category::OnChainSecurity {
        prompt.push_str("security_signals may also be used.\n");
        prompt.push_str(
            "If on_chain_security.note exists, treat this as limited contract signals.\n",
        );
    }
    prompt.push_str(OUTPUT_CONTRACT);
    prompt.push_str("\n\n");
    prompt.push_str(&payload);

    prompt
}

/// The subset of the context visible to `category`'s assessor.
pub fn scoped_payload(category: Category, context: &InputContext) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::from(context.name.as_str()));

    if let Some(ref symbol) = context.symbol {
        payload.insert("symbol".to_string(), Value::from(symbol.as_str()));
    }
    if let Some(age_days) = context.age_days {
        payload.insert("age_days".to_string(), Value::from(age_days));
    }

    let data = context.category_data(category).cloned().unwrap_or_default();
    payload.insert(category.as_str().to_string(), Value::Object(data));

    if category == Category::OnChainSecurity {
        if let Some(ref signals) = context.security_signals {
            payload.insert(
                "security_signals".to_string(),
                Value::Object(signals.clone()),
            );
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> InputContext {
        serde_json::from_str(include_str!("../../fixtures/context_btc.json")).unwrap()
    }

    #[test]
    fn test_payload_is_scoped_to_category() {
        let ctx = btc();

        let market = scoped_payload(Category::MarketIntegrity, &ctx);
        let keys: Vec<&str> = market.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        for key in ["name", "symbol", "age_days", "market_integrity"] {
            assert!(market.contains_key(key), "missing {}", key);
        }
        assert!(!market.contains_key("security_signals"));

        let dev = scoped_payload(Category::DevVelocity, &ctx);
        assert!(dev.contains_key("dev_velocity"));
        assert!(!dev.contains_key("market_integrity"));
        assert!(!dev.contains_key("on_chain_security"));
    }

    #[test]
    fn test_onchain_receives_security_signals() {
        let payload = scoped_payload(Category::OnChainSecurity, &btc());
        assert!(payload.contains_key("on_chain_security"));
        assert!(payload.contains_key("security_signals"));
        assert!(!payload.contains_key("dev_velocity"));
    }

    #[test]
    fn test_missing_category_data_is_empty_object() {
        let payload = scoped_payload(Category::SocialSentiment, &btc());
        assert_eq!(payload["social_sentiment"], Value::Object(Map::new()));
    }

    #[test]
    fn test_optional_identity_fields_are_omitted() {
        let ctx = InputContext {
            name: "Pepe".to_string(),
            ..Default::default()
        };
        let payload = scoped_payload(Category::MarketIntegrity, &ctx);
        assert!(!payload.contains_key("symbol"));
        assert!(!payload.contains_key("age_days"));
    }

    #[test]
    fn test_prompt_states_output_contract() {
        let prompt = build_prompt(Category::DevVelocity, &btc());
        assert!(prompt.contains("Dev Velocity subscore"));
        assert!(prompt.contains("subscore (number 0-100)"));
        assert!(prompt.contains("No markdown"));
        assert!(prompt.contains("\"recent_commits_4w\":108"));
        assert!(!prompt.contains("market_cap_usd"));
        assert!(!prompt.contains("No Ethereum contract"));
    }
}
