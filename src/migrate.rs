//! Schema versioning and type coercion for the durable slot.
//!
//! The persistence layer that originally wrote these documents did not
//! guarantee type fidelity across serialize/deserialize cycles: booleans
//! came back as strings, numbers as numeric strings. [`migrate`] is the
//! single authoritative coercion point: whatever was on disk, the subset
//! it returns holds canonical types.

use serde_json::Value;

use crate::persist::PersistedState;

/// Current schema version written alongside the persisted subset.
///
/// Version 1 documents predate type-safe persistence and may carry
/// truthy non-booleans and numeric strings; [`migrate`] corrects both.
pub(crate) const SCHEMA_VERSION: u32 = 2;

/// Transform a raw persisted document of any known version into the
/// current [`PersistedState`] shape.
///
/// Tolerates missing and wrong-typed fields: each field is extracted
/// independently and falls back to its initial value when absent or
/// uninterpretable. The same coercions run for current-version documents,
/// since the fragile fields (`isAuthenticated`, `walletBalance`) can be
/// corrupted regardless of version.
pub(crate) fn migrate(raw: &Value, version: u32) -> PersistedState {
    if version < SCHEMA_VERSION {
        tracing::debug!(
            from_version = version,
            to_version = SCHEMA_VERSION,
            "migrating persisted state"
        );
    }

    PersistedState {
        is_authenticated: truthy(raw.get("isAuthenticated")),
        user: raw
            .get("user")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        auth_token: raw
            .get("authToken")
            .and_then(Value::as_str)
            .map(str::to_owned),
        favorite_events: raw
            .get("favoriteEvents")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default(),
        wallet_balance: numeric(raw.get("walletBalance")),
    }
}

/// Coerce an arbitrary JSON value to a boolean using truthiness rules:
/// absent/null/false/0/"" are false, everything else is true.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Coerce an arbitrary JSON value to a finite number, defaulting to 0.
///
/// Numeric strings parse; booleans map to 0/1; anything else, including
/// non-finite results, falls back to 0.
fn numeric(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => f,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_v1_document_is_coerced_and_defaulted() {
        let raw = json!({
            "isAuthenticated": "yes",
            "walletBalance": "500",
        });

        let state = migrate(&raw, 1);

        assert!(state.is_authenticated);
        assert_eq!(state.wallet_balance, 500.0);
        assert!(state.user.is_none());
        assert!(state.auth_token.is_none());
        assert!(state.favorite_events.is_empty());
    }

    #[test]
    fn current_version_still_reconciles_fragile_fields() {
        let raw = json!({
            "isAuthenticated": 1,
            "walletBalance": "42.5",
            "favoriteEvents": ["e-1", "e-2"],
            "authToken": "tok",
        });

        let state = migrate(&raw, SCHEMA_VERSION);

        assert!(state.is_authenticated);
        assert_eq!(state.wallet_balance, 42.5);
        assert_eq!(state.favorite_events, vec!["e-1", "e-2"]);
        assert_eq!(state.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn well_formed_document_passes_through_unchanged() {
        let user = crate::model::test_fixtures::sample_user("u-1");
        let raw = json!({
            "isAuthenticated": true,
            "user": serde_json::to_value(&user).unwrap(),
            "authToken": "tok",
            "favoriteEvents": ["e-7"],
            "walletBalance": 99.0,
        });

        let state = migrate(&raw, SCHEMA_VERSION);

        assert!(state.is_authenticated);
        assert_eq!(state.user, Some(user));
        assert_eq!(state.auth_token.as_deref(), Some("tok"));
        assert_eq!(state.favorite_events, vec!["e-7"]);
        assert_eq!(state.wallet_balance, 99.0);
    }

    #[test]
    fn empty_document_yields_initial_values() {
        let state = migrate(&json!({}), 1);
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn malformed_user_falls_back_to_none() {
        let raw = json!({ "user": "not-an-object" });
        let state = migrate(&raw, SCHEMA_VERSION);
        assert!(state.user.is_none());
    }

    #[test]
    fn truthiness_table() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(null))));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(truthy(Some(&json!(2))));
        assert!(truthy(Some(&json!([]))));
        assert!(truthy(Some(&json!({}))));
    }

    #[test]
    fn numeric_table() {
        assert_eq!(numeric(None), 0.0);
        assert_eq!(numeric(Some(&json!(null))), 0.0);
        assert_eq!(numeric(Some(&json!(12.5))), 12.5);
        assert_eq!(numeric(Some(&json!("500"))), 500.0);
        assert_eq!(numeric(Some(&json!(" 3.5 "))), 3.5);
        assert_eq!(numeric(Some(&json!("not a number"))), 0.0);
        assert_eq!(numeric(Some(&json!(true))), 1.0);
        assert_eq!(numeric(Some(&json!([1, 2]))), 0.0);
    }
}
