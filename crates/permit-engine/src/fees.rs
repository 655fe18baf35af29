//! Fee calculation.
//!
//! Three independent fee sources compose into one estimate: flat fees
//! keyed to the permit type, a single valuation-tiered line, and
//! conditional flat fees gated by form-data predicates. The breakdown
//! follows the pack's declaration order, and the tiered line rounds to
//! whole dollars before summation.
//!
//! A fee estimate is best-effort: if one fee source is misconfigured,
//! the failure becomes an `errors` entry and the partial total
//! accumulated so far is still returned.

use serde::{Deserialize, Serialize};

use permit_core::FormData;
use permit_pack::{FeeCharge, FeeRule, FeeTrigger, JurisdictionPack};

/// One line of the fee breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub fee_id: String,
    pub name: String,
    pub amount_usd: i64,
    /// Human-readable derivation, present for computed lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<String>,
}

/// The itemized fee estimate.
///
/// `total_usd` always equals the sum of the breakdown amounts, including
/// when `errors` is non-empty and the breakdown is partial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculation {
    pub total_usd: i64,
    pub breakdown: Vec<FeeLineItem>,
    pub errors: Vec<String>,
}

/// Compute the fee estimate for one application.
///
/// Rules are evaluated in pack declaration order. At most one valuation
/// tier contributes: the first whose inclusive range contains the
/// valuation. An absent valuation, or one beyond every tier, silently
/// produces no tier line — that is a pricing outcome, not an error.
pub fn calculate(pack: &JurisdictionPack, permit_type: &str, form: &FormData) -> FeeCalculation {
    let mut breakdown: Vec<FeeLineItem> = Vec::new();
    let mut errors = Vec::new();
    let mut total_usd: i64 = 0;
    let mut tier_applied = false;

    for rule in &pack.fees {
        let line = match evaluate_rule(rule, permit_type, form, &mut tier_applied) {
            Ok(line) => line,
            Err(reason) => {
                // Partial-result semantics: keep what was accumulated,
                // report the failure once, stop evaluating.
                tracing::warn!(rule = %rule.id, %reason, "fee rule evaluation failed");
                errors.push(format!("Error calculating fees: {reason}"));
                break;
            }
        };
        if let Some(line) = line {
            match total_usd.checked_add(line.amount_usd) {
                Some(sum) => {
                    total_usd = sum;
                    breakdown.push(line);
                }
                None => {
                    errors.push("Error calculating fees: total overflowed".to_string());
                    break;
                }
            }
        }
    }

    FeeCalculation {
        total_usd,
        breakdown,
        errors,
    }
}

fn evaluate_rule(
    rule: &FeeRule,
    permit_type: &str,
    form: &FormData,
    tier_applied: &mut bool,
) -> Result<Option<FeeLineItem>, String> {
    match &rule.charge {
        FeeCharge::PermitTypeFlat {
            permit_type: fee_permit_type,
            amount_usd,
        } => {
            if fee_permit_type == permit_type {
                Ok(Some(FeeLineItem {
                    fee_id: rule.id.clone(),
                    name: rule.name.clone(),
                    amount_usd: *amount_usd,
                    calculation: None,
                }))
            } else {
                Ok(None)
            }
        }

        FeeCharge::ValuationTiered { rate, .. } => {
            if *tier_applied {
                return Ok(None);
            }
            let Some(valuation) = form.valuation_usd() else {
                return Ok(None);
            };
            if !rule.charge.tier_contains(valuation) {
                return Ok(None);
            }
            *tier_applied = true;

            let raw = valuation * rate;
            if !raw.is_finite() || raw.abs() >= 9e18 {
                return Err(format!(
                    "valuation fee for rule '{}' is not representable",
                    rule.id
                ));
            }
            let amount_usd = raw.round() as i64;
            let pct = fmt_percent(*rate);
            Ok(Some(FeeLineItem {
                fee_id: rule.id.clone(),
                name: format!("Valuation Fee ({pct}%)"),
                amount_usd,
                calculation: Some(format!(
                    "${} × {pct}% = ${amount_usd}",
                    fmt_usd(valuation)
                )),
            }))
        }

        FeeCharge::Conditional {
            trigger,
            amount_usd,
        } => {
            let applies = match trigger {
                FeeTrigger::Always => true,
                FeeTrigger::AttachmentPresent(kind) => form.has_attachment(kind),
            };
            if applies {
                Ok(Some(FeeLineItem {
                    fee_id: rule.id.clone(),
                    name: rule.name.clone(),
                    amount_usd: *amount_usd,
                    calculation: None,
                }))
            } else {
                Ok(None)
            }
        }
    }
}

/// Render a rate as a percentage without float noise (0.015 → "1.5").
fn fmt_percent(rate: f64) -> String {
    let pct = (rate * 100_000.0).round() / 1_000.0;
    format!("{pct}")
}

/// Render a dollar figure, dropping a trailing `.0` for whole amounts.
fn fmt_usd(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 9e15 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}
