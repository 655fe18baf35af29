//! Form validation against a jurisdiction pack's field rules.
//!
//! Evaluation is exhaustive: apart from the unknown-permit-type
//! fast path, every field rule and every required-attachment check runs,
//! so a caller can present the complete problem list at once.

use serde::{Deserialize, Serialize};

use permit_core::{FieldValue, FormData};
use permit_pack::{FieldRule, JurisdictionPack};

/// Valuations below this soft threshold draw an advisory warning.
const LOW_VALUATION_WARNING_USD: f64 = 1_000.0;

/// Machine-readable validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RequiredField,
    MinValue,
    MinLength,
    MaxValue,
    MaxLength,
    InvalidFormat,
    InvalidOption,
    MissingAttachment,
    InvalidPermitType,
}

impl ErrorCode {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredField => "REQUIRED_FIELD",
            Self::MinValue => "MIN_VALUE",
            Self::MinLength => "MIN_LENGTH",
            Self::MaxValue => "MAX_VALUE",
            Self::MaxLength => "MAX_LENGTH",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidOption => "INVALID_OPTION",
            Self::MissingAttachment => "MISSING_ATTACHMENT",
            Self::InvalidPermitType => "INVALID_PERMIT_TYPE",
        }
    }
}

/// One validation problem, tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

/// The full outcome of validating one application.
///
/// `is_valid` is true iff `errors` is empty; warnings are advisory and
/// never block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn new(errors: Vec<FieldError>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate form data against one permit type's rules.
///
/// An unknown permit type fails fast with a single
/// [`ErrorCode::InvalidPermitType`] error and no further evaluation —
/// the rest of the rule set is meaningless without a definition. Every
/// other path accumulates the complete error set.
pub fn validate(pack: &JurisdictionPack, permit_type: &str, form: &FormData) -> ValidationResult {
    let Some(definition) = pack.permit_type(permit_type) else {
        return ValidationResult::new(
            vec![FieldError {
                field: "permit_type".to_string(),
                message: format!("Invalid permit type: {permit_type}"),
                code: ErrorCode::InvalidPermitType,
            }],
            Vec::new(),
        );
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (field_name, rule) in &definition.fields {
        validate_field(field_name, form.values.get(field_name), rule, &mut errors);
    }

    for kind in &definition.attachments {
        if !form.has_attachment(kind) {
            errors.push(FieldError {
                field: format!("attachments.{kind}"),
                message: format!("Required attachment missing: {kind}"),
                code: ErrorCode::MissingAttachment,
            });
        }
    }

    if let Some(valuation) = form.valuation_usd() {
        if valuation < LOW_VALUATION_WARNING_USD {
            warnings.push(
                "Low valuation amount may require additional documentation".to_string(),
            );
        }
    }

    ValidationResult::new(errors, warnings)
}

/// Evaluate one field. A required-and-absent field yields exactly one
/// error and skips the remaining checks; a present value can accumulate
/// several.
fn validate_field(
    field: &str,
    value: Option<&FieldValue>,
    rule: &FieldRule,
    errors: &mut Vec<FieldError>,
) {
    let absent = value.map_or(true, FieldValue::is_empty);
    if absent {
        if rule.required {
            errors.push(FieldError {
                field: field.to_string(),
                message: format!("{field} is required"),
                code: ErrorCode::RequiredField,
            });
        }
        return;
    }
    let value = match value {
        Some(v) => v,
        None => return,
    };

    if let Some(min) = rule.min {
        match value {
            FieldValue::Number(n) if *n < min => errors.push(FieldError {
                field: field.to_string(),
                message: format!("{field} must be at least {}", fmt_bound(min)),
                code: ErrorCode::MinValue,
            }),
            FieldValue::Text(s) if (s.chars().count() as f64) < min => errors.push(FieldError {
                field: field.to_string(),
                message: format!("{field} must be at least {} characters", fmt_bound(min)),
                code: ErrorCode::MinLength,
            }),
            _ => {}
        }
    }

    if let Some(max) = rule.max {
        match value {
            FieldValue::Number(n) if *n > max => errors.push(FieldError {
                field: field.to_string(),
                message: format!("{field} cannot exceed {}", fmt_bound(max)),
                code: ErrorCode::MaxValue,
            }),
            FieldValue::Text(s) if (s.chars().count() as f64) > max => errors.push(FieldError {
                field: field.to_string(),
                message: format!("{field} cannot exceed {} characters", fmt_bound(max)),
                code: ErrorCode::MaxLength,
            }),
            _ => {}
        }
    }

    if let (Some(pattern), FieldValue::Text(s)) = (&rule.pattern, value) {
        match regex::Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    errors.push(FieldError {
                        field: field.to_string(),
                        message: format!("{field} format is invalid"),
                        code: ErrorCode::InvalidFormat,
                    });
                }
            }
            // Patterns are checked at pack load; an uncompilable one
            // here means the pack bypassed the loader.
            Err(err) => tracing::warn!(field, %err, "skipping uncompilable field pattern"),
        }
    }

    if let Some(options) = &rule.options {
        if !options.is_empty() {
            let allowed = |candidate: &str| options.iter().any(|o| o == candidate);
            let ok = match value {
                FieldValue::Text(s) => allowed(s),
                FieldValue::Number(n) => allowed(&fmt_bound(*n)),
                FieldValue::List(items) => items.iter().all(|item| allowed(item)),
                FieldValue::Flag(_) => true,
            };
            if !ok {
                errors.push(FieldError {
                    field: field.to_string(),
                    message: format!("{field} must be one of: {}", options.join(", ")),
                    code: ErrorCode::InvalidOption,
                });
            }
        }
    }
}

/// Render a numeric bound without a trailing `.0` for whole numbers.
fn fmt_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 9e15 {
        format!("{}", bound as i64)
    } else {
        format!("{bound}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use permit_core::AhjKey;
    use permit_pack::{
        Coverage, PermitTypeDefinition, PortalDescriptor, PortalKind, SubmissionMethod,
        SubmissionSpec,
    };

    use super::*;

    fn test_pack() -> JurisdictionPack {
        let mut fields = BTreeMap::new();
        fields.insert(
            "valuation_usd".to_string(),
            FieldRule {
                required: true,
                min: Some(1_000.0),
                ..Default::default()
            },
        );
        fields.insert(
            "scope_description".to_string(),
            FieldRule {
                required: true,
                min: Some(20.0),
                max: Some(2_000.0),
                ..Default::default()
            },
        );
        fields.insert(
            "contractor_license".to_string(),
            FieldRule {
                required: true,
                pattern: Some("^MHIC-\\d{5,6}$".to_string()),
                ..Default::default()
            },
        );
        fields.insert(
            "structural_changes".to_string(),
            FieldRule {
                options: Some(vec![
                    "none".to_string(),
                    "load_bearing".to_string(),
                    "non_load_bearing".to_string(),
                ]),
                ..Default::default()
            },
        );

        let mut permit_types = BTreeMap::new();
        permit_types.insert(
            "residential_kitchen_remodel".to_string(),
            PermitTypeDefinition {
                label: "Residential Kitchen Remodel".to_string(),
                forms: vec!["building_permit_application".to_string()],
                attachments: vec!["plans".to_string(), "contractor_license".to_string()],
                fields,
                submission: SubmissionSpec {
                    method: SubmissionMethod::Email,
                    portal_driver: None,
                    fee_schedule: "v2025".to_string(),
                    sla_days: Some(15),
                },
            },
        );

        JurisdictionPack {
            key: AhjKey::new("us/md/gaithersburg").unwrap(),
            name: "City of Gaithersburg".to_string(),
            coverage: Coverage {
                state: "MD".to_string(),
                county: "Montgomery".to_string(),
                city: Some("Gaithersburg".to_string()),
                notes: None,
            },
            portal: PortalDescriptor {
                kind: PortalKind::Email,
                base_url: None,
                auth: Default::default(),
            },
            permit_types,
            fees: Vec::new(),
            inspections: Vec::new(),
        }
    }

    fn complete_form() -> FormData {
        let mut form = FormData::default();
        form.values.insert(
            "valuation_usd".to_string(),
            FieldValue::Number(5_000.0),
        );
        form.values.insert(
            "scope_description".to_string(),
            FieldValue::Text("Full kitchen remodel with relocated sink line".to_string()),
        );
        form.values.insert(
            "contractor_license".to_string(),
            FieldValue::Text("MHIC-12345".to_string()),
        );
        form.values.insert(
            "structural_changes".to_string(),
            FieldValue::Text("none".to_string()),
        );
        form.attachments
            .insert("plans".to_string(), "s3://docs/plans.pdf".to_string());
        form.attachments.insert(
            "contractor_license".to_string(),
            "s3://docs/license.pdf".to_string(),
        );
        form
    }

    #[test]
    fn complete_form_is_valid() {
        let result = validate(&test_pack(), "residential_kitchen_remodel", &complete_form());
        assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_permit_type_fails_fast() {
        let result = validate(&test_pack(), "helipad_construction", &complete_form());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::InvalidPermitType);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_form_reports_every_problem() {
        let result = validate(
            &test_pack(),
            "residential_kitchen_remodel",
            &FormData::default(),
        );
        assert!(!result.is_valid);

        let required: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.code == ErrorCode::RequiredField)
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(
            required,
            vec!["contractor_license", "scope_description", "valuation_usd"]
        );

        let missing_attachments: Vec<&str> = result
            .errors
            .iter()
            .filter(|e| e.code == ErrorCode::MissingAttachment)
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(
            missing_attachments,
            vec!["attachments.plans", "attachments.contractor_license"]
        );

        // One REQUIRED_FIELD per missing required field, one
        // MISSING_ATTACHMENT per missing attachment, nothing else.
        assert_eq!(result.errors.len(), 5);
    }

    #[test]
    fn warnings_never_change_validity() {
        let mut form = complete_form();
        form.values
            .insert("valuation_usd".to_string(), FieldValue::Number(800.0));
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        // 800 is below the 1000 minimum, so there is an error too; the
        // warning count is independent of it.
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.is_valid);

        let mut pack = test_pack();
        pack.permit_types
            .get_mut("residential_kitchen_remodel")
            .unwrap()
            .fields
            .get_mut("valuation_usd")
            .unwrap()
            .min = None;
        let result = validate(&pack, "residential_kitchen_remodel", &form);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn one_field_can_accumulate_multiple_errors() {
        let mut pack = test_pack();
        pack.permit_types
            .get_mut("residential_kitchen_remodel")
            .unwrap()
            .fields
            .insert(
                "scope_description".to_string(),
                FieldRule {
                    required: true,
                    min: Some(5.0),
                    pattern: Some("^[A-Z]".to_string()),
                    options: Some(vec!["unreachable".to_string()]),
                    ..Default::default()
                },
            );
        let mut form = complete_form();
        form.values.insert(
            "scope_description".to_string(),
            FieldValue::Text("ab".to_string()),
        );
        let result = validate(&pack, "residential_kitchen_remodel", &form);
        let codes: Vec<ErrorCode> = result
            .errors
            .iter()
            .filter(|e| e.field == "scope_description")
            .map(|e| e.code)
            .collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::MinLength,
                ErrorCode::InvalidFormat,
                ErrorCode::InvalidOption
            ]
        );
    }

    #[test]
    fn required_and_absent_short_circuits_other_checks() {
        let mut form = complete_form();
        form.values.insert(
            "contractor_license".to_string(),
            FieldValue::Text("   ".to_string()),
        );
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        let license_errors: Vec<&FieldError> = result
            .errors
            .iter()
            .filter(|e| e.field == "contractor_license")
            .collect();
        assert_eq!(license_errors.len(), 1);
        assert_eq!(license_errors[0].code, ErrorCode::RequiredField);
    }

    #[test]
    fn optional_empty_field_skips_all_checks() {
        let mut form = complete_form();
        form.values.remove("structural_changes");
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        assert!(result.is_valid);
    }

    #[test]
    fn numeric_bounds_use_value_comparison() {
        let mut form = complete_form();
        form.values
            .insert("valuation_usd".to_string(), FieldValue::Number(999.0));
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        let err = result
            .errors
            .iter()
            .find(|e| e.field == "valuation_usd")
            .unwrap();
        assert_eq!(err.code, ErrorCode::MinValue);
        assert_eq!(err.message, "valuation_usd must be at least 1000");
    }

    #[test]
    fn string_bounds_use_length_comparison() {
        let mut form = complete_form();
        form.values.insert(
            "scope_description".to_string(),
            FieldValue::Text("too short".to_string()),
        );
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        let err = result
            .errors
            .iter()
            .find(|e| e.field == "scope_description")
            .unwrap();
        assert_eq!(err.code, ErrorCode::MinLength);
    }

    #[test]
    fn pattern_mismatch_is_invalid_format() {
        let mut form = complete_form();
        form.values.insert(
            "contractor_license".to_string(),
            FieldValue::Text("MHIC12345".to_string()),
        );
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == ErrorCode::InvalidFormat));
    }

    #[test]
    fn option_mismatch_is_invalid_option() {
        let mut form = complete_form();
        form.values.insert(
            "structural_changes".to_string(),
            FieldValue::Text("cosmetic".to_string()),
        );
        let result = validate(&test_pack(), "residential_kitchen_remodel", &form);
        let err = result
            .errors
            .iter()
            .find(|e| e.field == "structural_changes")
            .unwrap();
        assert_eq!(err.code, ErrorCode::InvalidOption);
        assert!(err.message.contains("load_bearing"));
    }

    #[test]
    fn error_code_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::MissingAttachment).unwrap(),
            "\"MISSING_ATTACHMENT\""
        );
        assert_eq!(ErrorCode::InvalidPermitType.as_str(), "INVALID_PERMIT_TYPE");
    }
}
