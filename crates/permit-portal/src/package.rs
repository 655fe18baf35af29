//! Submission package assembly.

use chrono::Utc;
use sha2::{Digest, Sha256};

use permit_core::PermitCase;
use permit_pack::{JurisdictionPack, PermitTypeDefinition};

use crate::SubmissionPackage;

/// Domain prefix for package digests.
const PACKAGE_DIGEST_PREFIX: &[u8] = b"permit-package-v1\0";

/// Assemble the submission package for a case.
///
/// The package carries everything a driver needs to file the
/// application: required form templates, field values, and the
/// attachment manifest.
pub fn build_submission_package(
    case: &PermitCase,
    pack: &JurisdictionPack,
    definition: &PermitTypeDefinition,
) -> SubmissionPackage {
    SubmissionPackage {
        case_id: case.id,
        jurisdiction: pack.name.clone(),
        permit_type: definition.label.clone(),
        forms: definition.forms.clone(),
        fields: case.forms.clone(),
        attachments: case.attachments.clone(),
        built_at: Utc::now(),
    }
}

impl SubmissionPackage {
    /// Content digest of the package, hex-encoded SHA-256.
    ///
    /// Deterministic for identical content: the digest covers the
    /// case identifier, form list, field values, and attachment
    /// manifest under a domain prefix, but not `built_at`.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(PACKAGE_DIGEST_PREFIX);
        hasher.update(self.case_id.to_string().as_bytes());
        hasher.update(b"\0");
        for form in &self.forms {
            hasher.update(form.as_bytes());
            hasher.update(b"\0");
        }
        for (field, value) in &self.fields {
            hasher.update(field.as_bytes());
            hasher.update(b"=");
            // BTreeMap iteration keeps this canonical; serialization of
            // a FieldValue is stable.
            let encoded =
                serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
            hasher.update(encoded.as_bytes());
            hasher.update(b"\0");
        }
        for (kind, uri) in &self.attachments {
            hasher.update(kind.as_bytes());
            hasher.update(b"=");
            hasher.update(uri.as_bytes());
            hasher.update(b"\0");
        }
        let digest = hasher.finalize();
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}
