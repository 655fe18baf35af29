//! Pack structure: manifest, permit types, and field rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use permit_core::AhjKey;

use crate::fees::FeeRule;
use crate::inspections::InspectionRule;

/// How a jurisdiction accepts submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalKind {
    /// No electronic intake at all.
    None,
    /// Applications are emailed.
    Email,
    /// Documents uploaded to a shared drop.
    Upload,
    /// An Accela-style web portal.
    PortalLike,
    /// Bespoke integration.
    Custom,
}

/// Authentication mode for a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalAuth {
    #[default]
    None,
    Basic,
    Form,
}

/// Portal integration descriptor from the pack manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalDescriptor {
    pub kind: PortalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default)]
    pub auth: PortalAuth,
}

/// Geographic coverage of a pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub state: String,
    pub county: String,
    /// Present only for incorporated-city packs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Validation constraints for one form field. Constraints combine with
/// AND semantics: every constraint that applies must pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// The field must be present and non-empty.
    #[serde(default)]
    pub required: bool,
    /// Minimum numeric value, or minimum length for text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum numeric value, or maximum length for text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regex the full text value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Enumerated allowed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// How applications for one permit type are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMethod {
    Portal,
    Email,
    InPerson,
}

/// Submission metadata for a permit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSpec {
    pub method: SubmissionMethod,
    /// Driver identifier for portal submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_driver: Option<String>,
    /// Which fee schedule version prices this permit type.
    pub fee_schedule: String,
    /// Published review turnaround, in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_days: Option<u32>,
}

/// Everything the jurisdiction requires for one permit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitTypeDefinition {
    pub label: String,
    /// Required form template identifiers.
    #[serde(default)]
    pub forms: Vec<String>,
    /// Required attachment kinds.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Field validation rules keyed by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
    pub submission: SubmissionSpec,
}

/// The manifest sub-document: identity, coverage, portal integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub id: AhjKey,
    pub name: String,
    pub coverage: Coverage,
    pub portal: PortalDescriptor,
}

/// The assembled rule-set for one jurisdiction.
///
/// Owned by the loader, read-only to every consumer. The fee list
/// preserves declaration order; the breakdown a fee calculation emits
/// follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionPack {
    pub key: AhjKey,
    pub name: String,
    pub coverage: Coverage,
    pub portal: PortalDescriptor,
    pub permit_types: BTreeMap<String, PermitTypeDefinition>,
    #[serde(default)]
    pub fees: Vec<FeeRule>,
    #[serde(default)]
    pub inspections: Vec<InspectionRule>,
}

impl JurisdictionPack {
    /// Look up a permit type definition.
    pub fn permit_type(&self, permit_type: &str) -> Option<&PermitTypeDefinition> {
        self.permit_types.get(permit_type)
    }

    /// Look up an inspection rule by type identifier.
    pub fn inspection_rule(&self, inspection_type: &str) -> Option<&InspectionRule> {
        self.inspections
            .iter()
            .find(|rule| rule.inspection_type == inspection_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PortalKind::PortalLike).unwrap(),
            "\"portal_like\""
        );
        let parsed: PortalKind = serde_json::from_str("\"upload\"").unwrap();
        assert_eq!(parsed, PortalKind::Upload);
    }

    #[test]
    fn portal_auth_defaults_to_none() {
        let descriptor: PortalDescriptor =
            serde_json::from_str(r#"{"kind": "email"}"#).unwrap();
        assert_eq!(descriptor.auth, PortalAuth::None);
        assert!(descriptor.base_url.is_none());
    }

    #[test]
    fn field_rule_defaults() {
        let rule: FieldRule = serde_json::from_str("{}").unwrap();
        assert!(!rule.required);
        assert!(rule.min.is_none());
        assert!(rule.options.is_none());
    }

    #[test]
    fn manifest_parses() {
        let manifest: PackManifest = serde_json::from_str(
            r#"{
                "id": "us/md/gaithersburg",
                "name": "City of Gaithersburg",
                "coverage": {"state": "MD", "county": "Montgomery", "city": "Gaithersburg"},
                "portal": {"kind": "portal_like", "base_url": "https://permits.example.gov", "auth": "form"}
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.id.as_str(), "us/md/gaithersburg");
        assert_eq!(manifest.coverage.city.as_deref(), Some("Gaithersburg"));
        assert_eq!(manifest.portal.kind, PortalKind::PortalLike);
    }

    #[test]
    fn manifest_rejects_invalid_key() {
        let result: Result<PackManifest, _> = serde_json::from_str(
            r#"{
                "id": "Gaithersburg MD",
                "name": "x",
                "coverage": {"state": "MD", "county": "Montgomery"},
                "portal": {"kind": "none"}
            }"#,
        );
        assert!(result.is_err());
    }
}
