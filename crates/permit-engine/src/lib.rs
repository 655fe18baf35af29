//! # permit-engine — Rule Evaluation & Pre-Check Orchestration
//!
//! The deterministic, auditable heart of the stack. Everything in this
//! crate is a pure function over immutable inputs — a loaded
//! [`JurisdictionPack`](permit_pack::JurisdictionPack) and a
//! [`FormData`](permit_core::FormData) — except the orchestrator, which
//! drives the sequence resolve → validate → price → persist against the
//! storage collaborator.
//!
//! ## Error posture
//!
//! Field-level validation problems and fee-calculation problems are
//! *data*, returned inside [`ValidationResult`] and [`FeeCalculation`];
//! they never abort a pre-check. Only pack loading, an unknown permit
//! type, and storage failures abort — and an aborted pre-check leaves
//! the case record untouched.

pub mod checklist;
pub mod fees;
pub mod precheck;
pub mod validator;

pub use checklist::{build_checklist, ChecklistItem, ChecklistStatus};
pub use fees::{calculate, FeeCalculation, FeeLineItem};
pub use precheck::{run_precheck, PreCheckError, PreCheckOutcome};
pub use validator::{validate, ErrorCode, FieldError, ValidationResult};
