//! Pack-level validation, run once at load time.
//!
//! Everything checked here is a configuration defect, not a property of
//! any particular application, so failures surface as `PackCorrupt`
//! rather than leaking into per-request validation results.

use crate::fees::FeeCharge;
use crate::model::{JurisdictionPack, SubmissionMethod};

/// Validate a fully-assembled pack. Returns every defect found.
pub fn validate_pack(pack: &JurisdictionPack) -> Vec<String> {
    let mut issues = Vec::new();

    for rule in &pack.fees {
        match &rule.charge {
            FeeCharge::ValuationTiered {
                min_usd,
                max_usd,
                rate,
            } => {
                if let Some(max) = max_usd {
                    if min_usd > max {
                        issues.push(format!(
                            "fee rule '{}': tier range [{min_usd}, {max}] is inverted",
                            rule.id
                        ));
                    }
                }
                if !rate.is_finite() || *rate < 0.0 || *rate > 1.0 {
                    issues.push(format!(
                        "fee rule '{}': rate {rate} is outside [0, 1]",
                        rule.id
                    ));
                }
            }
            FeeCharge::PermitTypeFlat { amount_usd, .. }
            | FeeCharge::Conditional { amount_usd, .. } => {
                if *amount_usd < 0 {
                    issues.push(format!(
                        "fee rule '{}': amount {amount_usd} is negative",
                        rule.id
                    ));
                }
            }
        }
    }

    for (type_id, definition) in &pack.permit_types {
        for (field, rule) in &definition.fields {
            if let Some(pattern) = &rule.pattern {
                if let Err(err) = regex::Regex::new(pattern) {
                    issues.push(format!(
                        "permit type '{type_id}', field '{field}': invalid pattern: {err}"
                    ));
                }
            }
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    issues.push(format!(
                        "permit type '{type_id}', field '{field}': min {min} exceeds max {max}"
                    ));
                }
            }
        }
        if definition.submission.method == SubmissionMethod::Portal
            && definition.submission.portal_driver.is_none()
        {
            issues.push(format!(
                "permit type '{type_id}': portal submission without a portal_driver"
            ));
        }
        if !pack.fees.is_empty()
            && !pack.fees.iter().any(|rule| {
                matches!(&rule.charge, FeeCharge::PermitTypeFlat { permit_type, .. }
                    if permit_type == type_id)
            })
        {
            // Not every permit type carries a base fee; worth noting but
            // not a defect.
            tracing::debug!(
                pack = %pack.key,
                permit_type = %type_id,
                "no base fee declared for permit type"
            );
        }
    }

    let known_inspections: Vec<&str> = pack
        .inspections
        .iter()
        .map(|rule| rule.inspection_type.as_str())
        .collect();
    for rule in &pack.inspections {
        if let Some(window) = &rule.scheduling_window {
            if window.min_days_out > window.max_days_out {
                issues.push(format!(
                    "inspection '{}': scheduling window [{}, {}] is inverted",
                    rule.inspection_type, window.min_days_out, window.max_days_out
                ));
            }
        }
        for prerequisite in &rule.prerequisites {
            if !known_inspections.contains(&prerequisite.as_str()) {
                issues.push(format!(
                    "inspection '{}': unknown prerequisite '{prerequisite}'",
                    rule.inspection_type
                ));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use permit_core::AhjKey;

    use super::*;
    use crate::fees::{FeeRule, FeeTrigger};
    use crate::inspections::{InspectionRule, SchedulingWindow};
    use crate::model::{
        Coverage, FieldRule, PermitTypeDefinition, PortalDescriptor, PortalKind, SubmissionSpec,
    };

    fn empty_pack() -> JurisdictionPack {
        JurisdictionPack {
            key: AhjKey::new("us/md/rockville").unwrap(),
            name: "City of Rockville".to_string(),
            coverage: Coverage {
                state: "MD".to_string(),
                county: "Montgomery".to_string(),
                city: Some("Rockville".to_string()),
                notes: None,
            },
            portal: PortalDescriptor {
                kind: PortalKind::Email,
                base_url: None,
                auth: Default::default(),
            },
            permit_types: BTreeMap::new(),
            fees: Vec::new(),
            inspections: Vec::new(),
        }
    }

    #[test]
    fn clean_pack_has_no_issues() {
        assert!(validate_pack(&empty_pack()).is_empty());
    }

    #[test]
    fn inverted_tier_is_flagged() {
        let mut pack = empty_pack();
        pack.fees.push(FeeRule {
            id: "valuation_tier_0".to_string(),
            name: "Tier".to_string(),
            charge: FeeCharge::ValuationTiered {
                min_usd: 10_000,
                max_usd: Some(5_000),
                rate: 0.02,
            },
        });
        let issues = validate_pack(&pack);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("inverted"));
    }

    #[test]
    fn out_of_range_rate_is_flagged() {
        let mut pack = empty_pack();
        pack.fees.push(FeeRule {
            id: "valuation_tier_0".to_string(),
            name: "Tier".to_string(),
            charge: FeeCharge::ValuationTiered {
                min_usd: 0,
                max_usd: None,
                rate: 1.5,
            },
        });
        assert!(!validate_pack(&pack).is_empty());
    }

    #[test]
    fn negative_flat_amount_is_flagged() {
        let mut pack = empty_pack();
        pack.fees.push(FeeRule {
            id: "additional_inspection_fee".to_string(),
            name: "Inspection Fee".to_string(),
            charge: FeeCharge::Conditional {
                trigger: FeeTrigger::Always,
                amount_usd: -5,
            },
        });
        assert!(!validate_pack(&pack).is_empty());
    }

    #[test]
    fn bad_field_pattern_is_flagged() {
        let mut pack = empty_pack();
        let mut fields = BTreeMap::new();
        fields.insert(
            "contractor_license".to_string(),
            FieldRule {
                pattern: Some("([".to_string()),
                ..Default::default()
            },
        );
        pack.permit_types.insert(
            "deck_construction".to_string(),
            PermitTypeDefinition {
                label: "Deck".to_string(),
                forms: vec![],
                attachments: vec![],
                fields,
                submission: SubmissionSpec {
                    method: SubmissionMethod::Email,
                    portal_driver: None,
                    fee_schedule: "v2025".to_string(),
                    sla_days: None,
                },
            },
        );
        let issues = validate_pack(&pack);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("invalid pattern"));
    }

    #[test]
    fn portal_submission_requires_driver() {
        let mut pack = empty_pack();
        pack.permit_types.insert(
            "deck_construction".to_string(),
            PermitTypeDefinition {
                label: "Deck".to_string(),
                forms: vec![],
                attachments: vec![],
                fields: BTreeMap::new(),
                submission: SubmissionSpec {
                    method: SubmissionMethod::Portal,
                    portal_driver: None,
                    fee_schedule: "v2025".to_string(),
                    sla_days: None,
                },
            },
        );
        let issues = validate_pack(&pack);
        assert!(issues.iter().any(|issue| issue.contains("portal_driver")));
    }

    #[test]
    fn dangling_inspection_prerequisite_is_flagged() {
        let mut pack = empty_pack();
        pack.inspections.push(InspectionRule {
            inspection_type: "final".to_string(),
            label: "Final".to_string(),
            prerequisites: vec!["framing".to_string()],
            scheduling_window: None,
        });
        let issues = validate_pack(&pack);
        assert!(issues.iter().any(|issue| issue.contains("framing")));
    }

    #[test]
    fn inverted_scheduling_window_is_flagged() {
        let mut pack = empty_pack();
        pack.inspections.push(InspectionRule {
            inspection_type: "final".to_string(),
            label: "Final".to_string(),
            prerequisites: vec![],
            scheduling_window: Some(SchedulingWindow {
                min_days_out: 10,
                max_days_out: 2,
                available_days: vec![],
            }),
        });
        assert!(!validate_pack(&pack).is_empty());
    }
}
