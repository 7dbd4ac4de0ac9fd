//! Data models for Ninja Bucks
//!
//! Defines the roster entry (`Ninja`) and the wire shapes of the remote
//! document. Field names on the wire follow the hosted document
//! (`ninjaName`, `ninjaBucks`), so existing bins keep working.

use serde::{Deserialize, Serialize};

/// A named ninja with a balance of ninja bucks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ninja {
    /// Display name, uppercased at creation
    #[serde(rename = "ninjaName")]
    pub name: String,
    /// Current balance (may go negative after spending)
    #[serde(rename = "ninjaBucks")]
    pub bucks: i64,
}

impl Ninja {
    /// Create a ninja, normalizing the name (trimmed, uppercased)
    ///
    /// No validation happens here; see [`crate::roster::Roster::append`].
    pub fn new(name: &str, bucks: i64) -> Self {
        Self {
            name: normalize_name(name),
            bucks,
        }
    }
}

/// Trim surrounding whitespace and uppercase
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Sum of all balances, or `None` if it does not fit in an i64
pub fn total_bucks(ninjas: &[Ninja]) -> Option<i64> {
    ninjas
        .iter()
        .try_fold(0i64, |total, ninja| total.checked_add(ninja.bucks))
}

/// The full document stored in the remote bin
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NinjaDocument {
    /// Every ninja, in roster order
    #[serde(default)]
    pub ninjas: Vec<Ninja>,
}

impl NinjaDocument {
    pub fn new(ninjas: Vec<Ninja>) -> Self {
        Self { ninjas }
    }
}

/// Response body of a `GET {bin}/latest` request
///
/// The store wraps the document in `record` next to a `metadata` object we
/// don't use.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestResponse {
    pub record: NinjaDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_bucks() {
        assert_eq!(total_bucks(&[]), Some(0));
        assert_eq!(
            total_bucks(&[Ninja::new("kai", 10), Ninja::new("jay", -3)]),
            Some(7)
        );
        assert_eq!(
            total_bucks(&[Ninja::new("kai", i64::MAX), Ninja::new("jay", 1)]),
            None
        );
        assert_eq!(
            total_bucks(&[Ninja::new("kai", i64::MIN), Ninja::new("jay", -1)]),
            None
        );
    }

    #[test]
    fn test_ninja_new_normalizes_name() {
        let ninja = Ninja::new("  ace  ", 0);
        assert_eq!(ninja.name, "ACE");
        assert_eq!(ninja.bucks, 0);
    }

    #[test]
    fn test_ninja_wire_names() {
        let ninja = Ninja::new("kai", 10);
        let json = serde_json::to_value(&ninja).unwrap();
        assert_eq!(json, serde_json::json!({"ninjaName": "KAI", "ninjaBucks": 10}));
    }

    #[test]
    fn test_document_serialization() {
        let doc = NinjaDocument::new(vec![Ninja::new("kai", 15)]);
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"ninjas":[{"ninjaName":"KAI","ninjaBucks":15}]}"#);
    }

    #[test]
    fn test_document_missing_ninjas_is_empty() {
        let doc: NinjaDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.ninjas.is_empty());
    }

    #[test]
    fn test_latest_response_ignores_metadata() {
        let body = r#"{
            "record": {"ninjas": [{"ninjaName": "KAI", "ninjaBucks": 10}, {"ninjaName": "ZANE", "ninjaBucks": -2}]},
            "metadata": {"id": "abc123", "private": true}
        }"#;

        let latest: LatestResponse = serde_json::from_str(body).unwrap();
        assert_eq!(latest.record.ninjas.len(), 2);
        assert_eq!(latest.record.ninjas[1].name, "ZANE");
        assert_eq!(latest.record.ninjas[1].bucks, -2);
    }

    #[test]
    fn test_names_are_kept_verbatim_on_read() {
        // Only creation normalizes; whatever the bin holds is shown as-is
        let doc: NinjaDocument =
            serde_json::from_str(r#"{"ninjas":[{"ninjaName":"lower","ninjaBucks":1}]}"#).unwrap();
        assert_eq!(doc.ninjas[0].name, "lower");
    }
}
