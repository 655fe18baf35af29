//! # permit-core — Domain Primitives for the Permit Workflow Stack
//!
//! Shared vocabulary for every other crate in the workspace: jurisdiction
//! keys and the AHJ (Authority Having Jurisdiction) resolver, permit case
//! lifecycle status, the record types persisted by the storage
//! collaborator, structured form values, and immutable audit events.
//!
//! This crate is deliberately free of I/O. Everything here is a plain
//! value type; loading, validation, and orchestration live in the crates
//! layered above it.

pub mod ahj;
pub mod error;
pub mod event;
pub mod form;
pub mod id;
pub mod records;
pub mod status;

pub use ahj::{resolve_ahj, validate_address, AddressInput, AhjKey};
pub use error::{ResolveError, ValidationError};
pub use event::AuditEvent;
pub use form::{FieldValue, FormData};
pub use id::{
    CaseId, DocumentId, EventId, InspectionId, LocationId, OrgId, ProjectId, SessionId,
};
pub use records::{
    AuthSession, DocumentRecord, InspectionRecord, InspectionResult, Location, Org, OrgUser,
    PermitCase, Project, Role,
};
pub use status::CaseStatus;
