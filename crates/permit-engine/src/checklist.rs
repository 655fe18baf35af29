//! Checklist projection.
//!
//! The pre-check response shows contractors a human-facing checklist,
//! not raw validator output. Items are derived from the validation
//! result plus a few jurisdiction-independent advisories.

use serde::{Deserialize, Serialize};

use permit_core::FormData;
use permit_pack::PermitTypeDefinition;

use crate::validator::{ErrorCode, ValidationResult};

/// Valuation floor assumed when the permit type doesn't declare one.
const DEFAULT_MIN_VALUATION_USD: f64 = 1_000.0;

/// Valuations above this draw the energy-code documentation advisory.
const ENERGY_CODE_THRESHOLD_USD: f64 = 10_000.0;

/// Outcome of one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    Passed,
    Failed,
    Warning,
}

/// One human-facing checklist line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    pub status: ChecklistStatus,
    pub details: String,
}

impl ChecklistItem {
    fn new(item: &str, status: ChecklistStatus, details: impl Into<String>) -> Self {
        Self {
            item: item.to_string(),
            status,
            details: details.into(),
        }
    }
}

/// Project validator results into the checklist shown to the contractor.
pub fn build_checklist(
    definition: &PermitTypeDefinition,
    form: &FormData,
    validation: &ValidationResult,
) -> Vec<ChecklistItem> {
    let mut items = Vec::new();

    // Valuation floor.
    let min_valuation = definition
        .fields
        .get("valuation_usd")
        .and_then(|rule| rule.min)
        .unwrap_or(DEFAULT_MIN_VALUATION_USD);
    match form.valuation_usd() {
        Some(valuation) if valuation >= min_valuation => items.push(ChecklistItem::new(
            "Valuation meets minimum requirements",
            ChecklistStatus::Passed,
            format!("(${valuation:.0})"),
        )),
        _ => items.push(ChecklistItem::new(
            "Valuation meets minimum requirements",
            ChecklistStatus::Failed,
            format!("Minimum ${min_valuation:.0} required"),
        )),
    }

    // Field-level completeness, summarized.
    let field_issue_fields: Vec<&str> = validation
        .errors
        .iter()
        .filter(|e| e.code != ErrorCode::MissingAttachment)
        .map(|e| e.field.as_str())
        .collect();
    if field_issue_fields.is_empty() {
        items.push(ChecklistItem::new(
            "Application form fields are complete",
            ChecklistStatus::Passed,
            "",
        ));
    } else {
        let mut fields = field_issue_fields.clone();
        fields.dedup();
        items.push(ChecklistItem::new(
            "Application form fields are complete",
            ChecklistStatus::Failed,
            format!(
                "{} issue(s): {}",
                field_issue_fields.len(),
                fields.join(", ")
            ),
        ));
    }

    // One line per required attachment.
    for kind in &definition.attachments {
        if form.has_attachment(kind) {
            items.push(ChecklistItem::new(
                &format!("Required attachment '{kind}' is attached"),
                ChecklistStatus::Passed,
                "",
            ));
        } else {
            items.push(ChecklistItem::new(
                &format!("Required attachment '{kind}' is attached"),
                ChecklistStatus::Failed,
                format!("Upload a '{kind}' document before packaging"),
            ));
        }
    }

    // Energy-code advisory for larger projects.
    if form
        .valuation_usd()
        .is_some_and(|v| v > ENERGY_CODE_THRESHOLD_USD)
    {
        items.push(ChecklistItem::new(
            "Energy code compliance documentation",
            ChecklistStatus::Warning,
            "Required for projects over $10,000",
        ));
    }

    // Validator advisories.
    for warning in &validation.warnings {
        items.push(ChecklistItem::new(
            warning,
            ChecklistStatus::Warning,
            "",
        ));
    }

    items
}
