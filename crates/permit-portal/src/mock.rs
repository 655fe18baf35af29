//! Deterministic mock portal driver.
//!
//! Stands in for browser automation against a real jurisdiction portal.
//! Submissions mint a portal case id derived from the package, and each
//! status poll advances a canned review pipeline one step, so workflows
//! exercise every status transition without nondeterminism.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    InspectionConfirmation, InspectionRequest, PortalDriver, PortalError, PortalStatus,
    SubmissionPackage, SubmissionReceipt,
};

/// Review pipeline a mocked case walks through, one poll at a time.
const REVIEW_PIPELINE: &[&str] = &["Submitted", "Under Review", "Plans Review", "Approved"];

/// Mock implementation of [`PortalDriver`].
#[derive(Debug)]
pub struct MockPortal {
    prefix: String,
    poll_counts: Mutex<HashMap<String, usize>>,
    booking_counter: Mutex<u64>,
}

impl MockPortal {
    /// Create a mock portal whose case ids carry the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            poll_counts: Mutex::new(HashMap::new()),
            booking_counter: Mutex::new(0),
        }
    }
}

#[async_trait]
impl PortalDriver for MockPortal {
    async fn submit(&self, package: &SubmissionPackage) -> Result<SubmissionReceipt, PortalError> {
        // Derive the portal id from the package digest so resubmitting
        // identical content yields the same id.
        let digest = package.digest();
        let portal_case_id = format!("{}-{}", self.prefix, &digest[..12].to_uppercase());
        tracing::info!(
            case = %package.case_id,
            portal_case_id = %portal_case_id,
            jurisdiction = %package.jurisdiction,
            "mock portal accepted submission"
        );
        Ok(SubmissionReceipt {
            portal_case_id,
            receipt_url: Some(format!("screenshots/submit-{}.png", package.case_id)),
        })
    }

    async fn poll_status(&self, portal_case_id: &str) -> Result<PortalStatus, PortalError> {
        if portal_case_id.is_empty() {
            return Err(PortalError::Rejected("empty portal case id".to_string()));
        }
        let mut counts = self.poll_counts.lock();
        let count = counts.entry(portal_case_id.to_string()).or_insert(0);
        let status = REVIEW_PIPELINE[(*count).min(REVIEW_PIPELINE.len() - 1)];
        *count += 1;
        Ok(PortalStatus {
            status: status.to_string(),
            last_updated: Utc::now(),
            raw: serde_json::json!({ "portalResponse": format!("Status: {status}") }),
        })
    }

    async fn request_inspection(
        &self,
        portal_case_id: &str,
        request: &InspectionRequest,
    ) -> Result<InspectionConfirmation, PortalError> {
        if request.window_end < request.window_start {
            return Err(PortalError::Rejected(
                "inspection window end precedes start".to_string(),
            ));
        }
        let mut counter = self.booking_counter.lock();
        *counter += 1;
        Ok(InspectionConfirmation {
            confirmation_id: format!("INSP-{portal_case_id}-{counter:04}"),
        })
    }
}
