//! Property tests for fee calculation invariants.

use std::collections::BTreeMap;

use proptest::prelude::*;

use permit_core::{AhjKey, FieldValue, FormData};
use permit_engine::calculate;
use permit_pack::{
    Coverage, FeeCharge, FeeRule, FeeTrigger, JurisdictionPack, PortalDescriptor, PortalKind,
};

fn pack_with_fees(fees: Vec<FeeRule>) -> JurisdictionPack {
    JurisdictionPack {
        key: AhjKey::new("us/md/testville").unwrap(),
        name: "Testville".to_string(),
        coverage: Coverage {
            state: "MD".to_string(),
            county: "Montgomery".to_string(),
            city: None,
            notes: None,
        },
        portal: PortalDescriptor {
            kind: PortalKind::Email,
            base_url: None,
            auth: Default::default(),
        },
        permit_types: BTreeMap::new(),
        fees,
        inspections: Vec::new(),
    }
}

fn arb_charge() -> impl Strategy<Value = FeeCharge> {
    prop_oneof![
        (0i64..5_000).prop_map(|amount_usd| FeeCharge::PermitTypeFlat {
            permit_type: "residential_kitchen_remodel".to_string(),
            amount_usd,
        }),
        (0i64..50_000, proptest::option::of(0i64..100_000), 0.0f64..=1.0).prop_map(
            |(low, span, rate)| FeeCharge::ValuationTiered {
                min_usd: low,
                max_usd: span.map(|s| low + s),
                rate,
            }
        ),
        (0i64..5_000, prop_oneof![
            Just(FeeTrigger::Always),
            Just(FeeTrigger::AttachmentPresent("plans".to_string())),
        ])
        .prop_map(|(amount_usd, trigger)| FeeCharge::Conditional { trigger, amount_usd }),
    ]
}

fn arb_fees() -> impl Strategy<Value = Vec<FeeRule>> {
    proptest::collection::vec(arb_charge(), 0..12).prop_map(|charges| {
        charges
            .into_iter()
            .enumerate()
            .map(|(index, charge)| FeeRule {
                id: format!("rule_{index}"),
                name: format!("Rule {index}"),
                charge,
            })
            .collect()
    })
}

fn form(valuation: Option<i64>, with_plans: bool) -> FormData {
    let mut form = FormData::default();
    if let Some(v) = valuation {
        form.values
            .insert("valuation_usd".to_string(), FieldValue::Number(v as f64));
    }
    if with_plans {
        form.attachments
            .insert("plans".to_string(), "s3://docs/plans.pdf".to_string());
    }
    form
}

proptest! {
    /// The headline invariant: the total always equals the sum of the
    /// breakdown, for any pack/input pair — including partial results.
    #[test]
    fn total_equals_breakdown_sum(
        fees in arb_fees(),
        valuation in proptest::option::of(0i64..1_000_000),
        with_plans in any::<bool>(),
    ) {
        let pack = pack_with_fees(fees);
        let result = calculate(&pack, "residential_kitchen_remodel", &form(valuation, with_plans));
        let sum: i64 = result.breakdown.iter().map(|line| line.amount_usd).sum();
        prop_assert_eq!(result.total_usd, sum);
    }

    /// At most one valuation-tier line ever contributes, whatever the
    /// tier layout.
    #[test]
    fn at_most_one_tier_line(
        fees in arb_fees(),
        valuation in proptest::option::of(0i64..1_000_000),
    ) {
        let pack = pack_with_fees(fees);
        let result = calculate(&pack, "residential_kitchen_remodel", &form(valuation, false));
        let tier_lines = result
            .breakdown
            .iter()
            .filter(|line| line.calculation.is_some())
            .count();
        prop_assert!(tier_lines <= 1);
    }

    /// Calculation is deterministic: same inputs, same estimate.
    #[test]
    fn calculation_is_deterministic(
        fees in arb_fees(),
        valuation in proptest::option::of(0i64..1_000_000),
        with_plans in any::<bool>(),
    ) {
        let pack = pack_with_fees(fees);
        let input = form(valuation, with_plans);
        let first = calculate(&pack, "residential_kitchen_remodel", &input);
        let second = calculate(&pack, "residential_kitchen_remodel", &input);
        prop_assert_eq!(first, second);
    }
}
