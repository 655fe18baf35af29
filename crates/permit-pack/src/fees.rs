//! Fee rules and the fee-schedule document.
//!
//! The on-disk document groups fees into versioned schedules; the loader
//! flattens the schedule named by `current` into one ordered [`FeeRule`]
//! list. Flattening order is base fees, then valuation tiers, then
//! conditional fees, each in document order — the fee calculator's
//! breakdown preserves it.

use serde::{Deserialize, Serialize};

use permit_core::AhjKey;

use crate::error::{PackError, PackResult};

/// Predicate gating a conditional flat fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTrigger {
    /// The fee applies to every application.
    Always,
    /// The fee applies when the named attachment kind is present.
    AttachmentPresent(String),
}

/// How one fee line item is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeeCharge {
    /// Flat fee applied when the application's permit type matches.
    PermitTypeFlat { permit_type: String, amount_usd: i64 },
    /// Percentage-of-valuation fee for the tier containing the valuation.
    /// Bounds are inclusive; an absent `max_usd` means open-ended.
    ValuationTiered {
        min_usd: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_usd: Option<i64>,
        rate: f64,
    },
    /// Flat fee gated by a predicate over the form data.
    Conditional { trigger: FeeTrigger, amount_usd: i64 },
}

impl FeeCharge {
    /// Whether a tiered charge's range contains the valuation.
    /// Always false for non-tiered charges.
    pub fn tier_contains(&self, valuation_usd: f64) -> bool {
        match self {
            Self::ValuationTiered {
                min_usd, max_usd, ..
            } => {
                valuation_usd >= *min_usd as f64
                    && max_usd.map_or(true, |max| valuation_usd <= max as f64)
            }
            _ => false,
        }
    }
}

/// One fee line item in a jurisdiction pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRule {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub charge: FeeCharge,
}

// ---------------------------------------------------------------------------
// Fee-schedule document
// ---------------------------------------------------------------------------

/// A base (per-permit-type) fee entry as written in `fees.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BaseFeeSpec {
    pub permit_type: String,
    pub amount_usd: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A valuation tier entry: inclusive `[min, max]` range (open-ended max
/// written as `null`) and a rate applied to the valuation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TierSpec {
    pub range: (i64, Option<i64>),
    pub rate: f64,
}

/// A conditional flat fee entry.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AdditionalFeeSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub amount_usd: i64,
    pub applies: FeeTrigger,
}

/// One named fee schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FeeScheduleSpec {
    #[serde(default)]
    pub base_fees: Vec<BaseFeeSpec>,
    #[serde(default)]
    pub valuation_tiers: Vec<TierSpec>,
    #[serde(default)]
    pub additional_fees: Vec<AdditionalFeeSpec>,
}

/// The `fees.yaml` document: versioned schedules plus a pointer naming
/// the one in force.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FeeDocument {
    pub current: String,
    pub fee_schedules: std::collections::BTreeMap<String, FeeScheduleSpec>,
}

/// Title-case-ish display name from a permit-type identifier.
fn humanize(identifier: &str) -> String {
    identifier.replace('_', " ")
}

/// Flatten the document's current schedule into an ordered rule list.
///
/// # Errors
///
/// `PackCorrupt` when the `current` pointer dangles. Range and rate
/// validation happens at the pack level (`validation::validate_pack`).
pub(crate) fn flatten_fee_document(
    key: &AhjKey,
    document: FeeDocument,
) -> PackResult<Vec<FeeRule>> {
    let schedule = document.fee_schedules.get(&document.current).ok_or_else(|| {
        PackError::corrupt(
            key,
            format!(
                "fees.yaml: current schedule '{}' is not defined",
                document.current
            ),
        )
    })?;

    let mut rules = Vec::new();

    for base in &schedule.base_fees {
        rules.push(FeeRule {
            id: format!("base_{}", base.permit_type),
            name: base
                .name
                .clone()
                .unwrap_or_else(|| format!("Base Fee: {}", humanize(&base.permit_type))),
            charge: FeeCharge::PermitTypeFlat {
                permit_type: base.permit_type.clone(),
                amount_usd: base.amount_usd,
            },
        });
    }

    for (index, tier) in schedule.valuation_tiers.iter().enumerate() {
        let (min_usd, max_usd) = tier.range;
        rules.push(FeeRule {
            id: format!("valuation_tier_{index}"),
            name: format!("Valuation Fee Tier {}", index + 1),
            charge: FeeCharge::ValuationTiered {
                min_usd,
                max_usd,
                rate: tier.rate,
            },
        });
    }

    for additional in &schedule.additional_fees {
        rules.push(FeeRule {
            id: format!("additional_{}", additional.id),
            name: additional
                .name
                .clone()
                .unwrap_or_else(|| format!("Additional Fee: {}", humanize(&additional.id))),
            charge: FeeCharge::Conditional {
                trigger: additional.applies.clone(),
                amount_usd: additional.amount_usd,
            },
        });
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
current: v2025
fee_schedules:
  v2025:
    base_fees:
      - permit_type: residential_kitchen_remodel
        amount_usd: 125
    valuation_tiers:
      - range: [0, 10000]
        rate: 0.015
      - range: [10001, 50000]
        rate: 0.02
      - range: [50001, null]
        rate: 0.025
    additional_fees:
      - id: plan_review
        amount_usd: 75
        applies:
          attachment_present: plans
      - id: inspection_fee
        amount_usd: 50
        applies: always
"#;

    fn key() -> AhjKey {
        AhjKey::new("us/md/gaithersburg").unwrap()
    }

    #[test]
    fn flattens_in_declaration_order() {
        let document: FeeDocument = serde_yaml::from_str(DOC).unwrap();
        let rules = flatten_fee_document(&key(), document).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "base_residential_kitchen_remodel",
                "valuation_tier_0",
                "valuation_tier_1",
                "valuation_tier_2",
                "additional_plan_review",
                "additional_inspection_fee",
            ]
        );
    }

    #[test]
    fn parses_triggers() {
        let document: FeeDocument = serde_yaml::from_str(DOC).unwrap();
        let rules = flatten_fee_document(&key(), document).unwrap();
        assert_eq!(
            rules[4].charge,
            FeeCharge::Conditional {
                trigger: FeeTrigger::AttachmentPresent("plans".to_string()),
                amount_usd: 75,
            }
        );
        assert_eq!(
            rules[5].charge,
            FeeCharge::Conditional {
                trigger: FeeTrigger::Always,
                amount_usd: 50,
            }
        );
    }

    #[test]
    fn open_ended_tier_parses() {
        let document: FeeDocument = serde_yaml::from_str(DOC).unwrap();
        let rules = flatten_fee_document(&key(), document).unwrap();
        assert_eq!(
            rules[3].charge,
            FeeCharge::ValuationTiered {
                min_usd: 50001,
                max_usd: None,
                rate: 0.025,
            }
        );
    }

    #[test]
    fn unknown_trigger_is_a_parse_error() {
        let doc = r#"
current: v2025
fee_schedules:
  v2025:
    additional_fees:
      - id: mystery
        amount_usd: 10
        applies: whenever_convenient
"#;
        let parsed: Result<FeeDocument, _> = serde_yaml::from_str(doc);
        assert!(parsed.is_err());
    }

    #[test]
    fn dangling_current_pointer_is_corrupt() {
        let doc = r#"
current: v2030
fee_schedules:
  v2025: {}
"#;
        let document: FeeDocument = serde_yaml::from_str(doc).unwrap();
        let err = flatten_fee_document(&key(), document).unwrap_err();
        assert!(matches!(err, PackError::Corrupt { .. }));
    }

    #[test]
    fn tier_containment_is_inclusive() {
        let tier = FeeCharge::ValuationTiered {
            min_usd: 0,
            max_usd: Some(10_000),
            rate: 0.015,
        };
        assert!(tier.tier_contains(0.0));
        assert!(tier.tier_contains(10_000.0));
        assert!(!tier.tier_contains(10_000.5));

        let open = FeeCharge::ValuationTiered {
            min_usd: 50_001,
            max_usd: None,
            rate: 0.025,
        };
        assert!(open.tier_contains(1_000_000.0));
        assert!(!open.tier_contains(50_000.0));
    }

    #[test]
    fn fee_rule_serializes_with_kind_tag() {
        let rule = FeeRule {
            id: "base_deck".to_string(),
            name: "Base Fee: deck".to_string(),
            charge: FeeCharge::PermitTypeFlat {
                permit_type: "deck".to_string(),
                amount_usd: 90,
            },
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["kind"], "permit_type_flat");
        assert_eq!(json["amount_usd"], 90);
        let back: FeeRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
