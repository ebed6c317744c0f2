//! Session schema versioning.
//!
//! Older deployments persisted the document verification flag as a
//! boolean. The upgrade runs once per session load, at the raw JSON
//! level, so business logic only ever sees the tri-state form.

use serde_json::Value;
use std::collections::BTreeMap;

use super::context::DOCUMENT_KEY_PREFIX;

/// Current session document schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Upgrades a raw context map from `version` to the current schema.
///
/// Returns the keys whose values changed so the caller can persist just
/// those. Idempotent: running on an already-current map changes nothing.
pub fn upgrade_context(version: u32, context: &mut BTreeMap<String, Value>) -> Vec<String> {
    let mut changed = Vec::new();

    if version < 2 {
        for (key, value) in context.iter_mut() {
            if !key.starts_with(DOCUMENT_KEY_PREFIX) {
                continue;
            }
            let Some(entry) = value.as_object_mut() else {
                continue;
            };
            if let Some(Value::Bool(verified)) = entry.get("is_verified") {
                let tri_state = if *verified { "verified" } else { "unverified" };
                entry.insert("is_verified".to_string(), Value::String(tri_state.into()));
                changed.push(key.clone());
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_boolean_true_becomes_verified() {
        let mut ctx = BTreeMap::from([(
            "document_ic_jpg".to_string(),
            json!({"is_verified": true, "extracted_data": {}}),
        )]);

        let changed = upgrade_context(1, &mut ctx);

        assert_eq!(changed, vec!["document_ic_jpg".to_string()]);
        assert_eq!(ctx["document_ic_jpg"]["is_verified"], json!("verified"));
    }

    #[test]
    fn legacy_boolean_false_becomes_unverified() {
        let mut ctx = BTreeMap::from([(
            "document_bill_pdf".to_string(),
            json!({"is_verified": false}),
        )]);

        upgrade_context(1, &mut ctx);

        assert_eq!(ctx["document_bill_pdf"]["is_verified"], json!("unverified"));
    }

    #[test]
    fn current_schema_is_untouched() {
        let mut ctx = BTreeMap::from([(
            "document_ic_jpg".to_string(),
            json!({"is_verified": "correcting"}),
        )]);

        let changed = upgrade_context(CURRENT_SCHEMA_VERSION, &mut ctx);

        assert!(changed.is_empty());
        assert_eq!(ctx["document_ic_jpg"]["is_verified"], json!("correcting"));
    }

    #[test]
    fn non_document_keys_are_ignored() {
        let mut ctx = BTreeMap::from([("timeout_awaiting_choice".to_string(), json!(true))]);
        assert!(upgrade_context(1, &mut ctx).is_empty());
        assert_eq!(ctx["timeout_awaiting_choice"], json!(true));
    }

    #[test]
    fn upgrade_is_idempotent() {
        let mut ctx = BTreeMap::from([(
            "document_ic_jpg".to_string(),
            json!({"is_verified": true}),
        )]);

        upgrade_context(1, &mut ctx);
        let changed_again = upgrade_context(1, &mut ctx);

        assert!(changed_again.is_empty());
    }
}
