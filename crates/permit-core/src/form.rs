//! Structured form data.
//!
//! Form payloads arrive as JSON but are held as a tagged union rather
//! than raw values, so the validator and fee calculator never branch on
//! loosely-typed JSON. Attachments are a separate manifest keyed by
//! attachment kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{PermitCase, Project};

/// Field name the fee calculator and validator read the project valuation
/// from.
pub const VALUATION_FIELD: &str = "valuation_usd";

/// Field name carrying the project's trade tags.
pub const TRADE_TAGS_FIELD: &str = "trade_tags";

/// One form field value.
///
/// Untagged: JSON booleans, numbers, strings, and string arrays map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag.
    Flag(bool),
    /// Numeric value (integers and decimals both land here).
    Number(f64),
    /// Free text.
    Text(String),
    /// List of strings (e.g. trade tags).
    List(Vec<String>),
}

impl FieldValue {
    /// Whether the value counts as absent for required-field purposes.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Flag(_) | Self::Number(_) => false,
        }
    }

    /// Numeric view, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// The candidate application data a pre-check evaluates: field values
/// plus the attachment manifest (kind → document reference).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    /// Field values keyed by field name.
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
    /// Attachment manifest: attachment kind → stored document URI.
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
}

impl FormData {
    /// Assemble form data for a case, overlaying the project's valuation
    /// and trade tags onto the case's form fields. The project is the
    /// source of truth for both.
    pub fn from_case(case: &PermitCase, project: &Project) -> Self {
        let mut values = case.forms.clone();
        if let Some(valuation) = project.valuation_usd {
            values.insert(
                VALUATION_FIELD.to_string(),
                FieldValue::Number(valuation as f64),
            );
        }
        if !project.trade_tags.is_empty() {
            values.insert(
                TRADE_TAGS_FIELD.to_string(),
                FieldValue::List(project.trade_tags.clone()),
            );
        }
        Self {
            values,
            attachments: case.attachments.clone(),
        }
    }

    /// Declared project valuation in USD, if present.
    pub fn valuation_usd(&self) -> Option<f64> {
        self.values.get(VALUATION_FIELD).and_then(FieldValue::as_number)
    }

    /// Whether an attachment of the given kind is present.
    pub fn has_attachment(&self, kind: &str) -> bool {
        self.attachments.contains_key(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_deserialization_picks_variants() {
        let v: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, FieldValue::Flag(true));
        let v: FieldValue = serde_json::from_str("5000").unwrap();
        assert_eq!(v, FieldValue::Number(5000.0));
        let v: FieldValue = serde_json::from_str("\"kitchen\"").unwrap();
        assert_eq!(v, FieldValue::Text("kitchen".to_string()));
        let v: FieldValue = serde_json::from_str("[\"electrical\"]").unwrap();
        assert_eq!(v, FieldValue::List(vec!["electrical".to_string()]));
    }

    #[test]
    fn emptiness() {
        assert!(FieldValue::Text("  ".to_string()).is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::Flag(false).is_empty());
    }

    #[test]
    fn valuation_accessor() {
        let mut form = FormData::default();
        assert_eq!(form.valuation_usd(), None);
        form.values
            .insert(VALUATION_FIELD.to_string(), FieldValue::Number(25_000.0));
        assert_eq!(form.valuation_usd(), Some(25_000.0));
    }

    #[test]
    fn attachment_lookup() {
        let mut form = FormData::default();
        form.attachments
            .insert("plans".to_string(), "s3://docs/plans.pdf".to_string());
        assert!(form.has_attachment("plans"));
        assert!(!form.has_attachment("site_plan"));
    }
}
