//! # permit-pack — Jurisdiction Rule Packs
//!
//! A jurisdiction pack is the authoritative, declarative rule-set for one
//! AHJ: which permit types it issues, which fields and attachments each
//! application needs, how fees are computed, and which inspections it
//! runs. Packs are plain data — evaluation lives in permit-engine.
//!
//! ## Documents
//!
//! Each jurisdiction directory holds four sub-documents:
//!
//! | File                | Format | Required | Contents                   |
//! |---------------------|--------|----------|----------------------------|
//! | `manifest.json`     | JSON   | yes      | identity, coverage, portal |
//! | `permit_types.json` | JSON   | yes      | permit-type table          |
//! | `fees.yaml`         | YAML   | no       | versioned fee schedules    |
//! | `inspections.yaml`  | YAML   | no       | inspection catalog         |
//!
//! Absent fee or inspection documents yield empty rule lists; a document
//! that is present but malformed is a load error, never a silent skip.
//!
//! ## Strong typing at load time
//!
//! Fee rules are parsed into tagged [`FeeCharge`](fees::FeeCharge)
//! variants when the pack loads. Malformed tiers (inverted ranges, rates
//! outside `[0, 1]`) and unknown conditional-fee triggers are load
//! errors, so the fee calculator never inspects loosely-typed condition
//! objects.

pub mod error;
pub mod fees;
pub mod inspections;
pub mod loader;
pub mod model;
pub mod validation;

pub use error::{PackError, PackResult};
pub use fees::{FeeCharge, FeeRule, FeeTrigger};
pub use inspections::{InspectionRule, SchedulingWindow, Weekday};
pub use loader::PackLoader;
pub use model::{
    Coverage, FieldRule, JurisdictionPack, PermitTypeDefinition, PortalDescriptor, PortalKind,
    SubmissionMethod, SubmissionSpec,
};
