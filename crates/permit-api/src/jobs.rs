//! Background job queue.
//!
//! Portal work (submission, status polling, inspection booking) runs off
//! the request path on a single worker task fed by an unbounded channel.
//! The queue is constructed per process and injected into the app state;
//! failed jobs retry with backoff when the failure is transient, and
//! permanent failures leave an audit event behind.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use permit_core::{AuditEvent, CaseId, CaseStatus, InspectionId, InspectionRecord, InspectionResult};
use permit_pack::{PackError, PackLoader};
use permit_portal::{
    build_submission_package, map_portal_status, DriverRegistry, InspectionRequest, PortalError,
};
use permit_state::{CasePatch, Storage, StorageError};

/// Retry backoff schedule; the last delay repeats.
const RETRY_DELAYS_MS: &[u64] = &[1_000, 5_000, 15_000, 60_000];

/// Attempts before a job is abandoned.
const MAX_ATTEMPTS: u32 = 3;

/// Work items the queue accepts.
#[derive(Debug, Clone)]
pub enum Job {
    /// Submit a packaged case to its jurisdiction portal.
    SubmitPermit { case_id: CaseId },
    /// Poll the portal for a submitted case's status.
    PollStatus { case_id: CaseId },
    /// Book an inspection within a date window.
    ScheduleInspection {
        case_id: CaseId,
        inspection_type: String,
        window_start: NaiveDate,
        window_end: NaiveDate,
    },
}

impl Job {
    fn kind(&self) -> &'static str {
        match self {
            Self::SubmitPermit { .. } => "submit_permit",
            Self::PollStatus { .. } => "poll_status",
            Self::ScheduleInspection { .. } => "schedule_inspection",
        }
    }

    fn case_id(&self) -> CaseId {
        match self {
            Self::SubmitPermit { case_id }
            | Self::PollStatus { case_id }
            | Self::ScheduleInspection { case_id, .. } => *case_id,
        }
    }
}

#[derive(Debug, Clone)]
struct QueuedJob {
    id: Uuid,
    job: Job,
    attempts: u32,
}

/// Failures while processing a job.
#[derive(Debug, Error)]
enum JobError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Portal(#[from] PortalError),
    /// The job can never succeed as enqueued.
    #[error("{0}")]
    Invalid(String),
}

impl JobError {
    /// Only transient portal outages are worth retrying.
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Portal(PortalError::Unavailable(_)))
    }
}

/// Collaborators the worker needs.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn Storage>,
    pub loader: Arc<PackLoader>,
    pub drivers: Arc<DriverRegistry>,
}

/// Handle for enqueueing jobs. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
}

impl JobQueue {
    /// Start the worker task and return the enqueue handle.
    pub fn start(ctx: JobContext) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedJob>();
        let requeue = tx.clone();

        tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                let attempt = queued.attempts + 1;
                tracing::info!(
                    job = %queued.id,
                    kind = queued.job.kind(),
                    attempt,
                    "processing job"
                );
                match process(&ctx, &queued.job).await {
                    Ok(()) => {
                        tracing::info!(job = %queued.id, kind = queued.job.kind(), "job completed");
                    }
                    Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                        let delay_ms = RETRY_DELAYS_MS
                            [usize::min((attempt - 1) as usize, RETRY_DELAYS_MS.len() - 1)];
                        tracing::warn!(
                            job = %queued.id,
                            kind = queued.job.kind(),
                            %err,
                            delay_ms,
                            "job failed; retrying"
                        );
                        let retry_tx = requeue.clone();
                        let retry = QueuedJob {
                            attempts: attempt,
                            ..queued
                        };
                        tokio::spawn(async move {
                            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                            let _ = retry_tx.send(retry);
                        });
                    }
                    Err(err) => {
                        tracing::error!(
                            job = %queued.id,
                            kind = queued.job.kind(),
                            %err,
                            "job abandoned"
                        );
                        record_failure(&ctx, &queued.job, &err);
                    }
                }
            }
        });

        Self { tx }
    }

    /// Enqueue a job; returns its identifier.
    pub fn enqueue(&self, job: Job) -> Uuid {
        let id = Uuid::new_v4();
        tracing::info!(job = %id, kind = job.kind(), case = %job.case_id(), "job enqueued");
        if self
            .tx
            .send(QueuedJob {
                id,
                job,
                attempts: 0,
            })
            .is_err()
        {
            tracing::error!(job = %id, "job queue worker is gone; job dropped");
        }
        id
    }
}

/// Best-effort failure event so the audit trail reflects abandoned work.
fn record_failure(ctx: &JobContext, job: &Job, err: &JobError) {
    let Ok(case) = ctx.store.get_case(job.case_id()) else {
        return;
    };
    let action = match job {
        Job::SubmitPermit { .. } => "SUBMIT_FAILED",
        Job::PollStatus { .. } => "POLL_FAILED",
        Job::ScheduleInspection { .. } => "INSPECTION_FAILED",
    };
    let event = AuditEvent::record::<(), serde_json::Value>(
        case.org_id,
        "PermitCase",
        case.id,
        "system",
        action,
        None,
        Some(&serde_json::json!({ "error": err.to_string() })),
    );
    if let Err(append_err) = ctx.store.append_event(event) {
        tracing::warn!(case = %case.id, %append_err, "failed to record job failure event");
    }
}

async fn process(ctx: &JobContext, job: &Job) -> Result<(), JobError> {
    match job {
        Job::SubmitPermit { case_id } => submit_permit(ctx, *case_id).await,
        Job::PollStatus { case_id } => poll_status(ctx, *case_id).await,
        Job::ScheduleInspection {
            case_id,
            inspection_type,
            window_start,
            window_end,
        } => schedule_inspection(ctx, *case_id, inspection_type, *window_start, *window_end).await,
    }
}

async fn submit_permit(ctx: &JobContext, case_id: CaseId) -> Result<(), JobError> {
    let case = ctx.store.get_case(case_id)?;
    if case.status.is_with_jurisdiction() {
        tracing::info!(case = %case_id, "case already submitted; skipping");
        return Ok(());
    }

    let pack = ctx.loader.load(&case.ahj_key)?;
    let definition = pack.permit_type(&case.permit_type).ok_or_else(|| {
        JobError::Invalid(format!(
            "permit type '{}' missing from pack {}",
            case.permit_type, case.ahj_key
        ))
    })?;
    let driver_id = definition.submission.portal_driver.as_deref().ok_or_else(|| {
        JobError::Invalid(format!(
            "permit type '{}' has no portal driver",
            case.permit_type
        ))
    })?;
    let driver = ctx.drivers.get(driver_id)?;

    let package = build_submission_package(&case, &pack, definition);
    let receipt = driver.submit(&package).await?;

    ctx.store.update_case_with_event(
        case.id,
        CasePatch {
            status: Some(CaseStatus::Submitted),
            portal_case_id: Some(receipt.portal_case_id.clone()),
            ..Default::default()
        },
        &|before, after| {
            let event = AuditEvent::record(
                before.org_id,
                "PermitCase",
                before.id,
                "system",
                "PERMIT_SUBMITTED",
                Some(before),
                Some(after),
            );
            match &receipt.receipt_url {
                Some(url) => event.with_evidence(url.clone()),
                None => event,
            }
        },
    )?;

    tracing::info!(
        case = %case_id,
        portal_case_id = %receipt.portal_case_id,
        "permit submitted"
    );
    Ok(())
}

async fn poll_status(ctx: &JobContext, case_id: CaseId) -> Result<(), JobError> {
    let case = ctx.store.get_case(case_id)?;
    let portal_case_id = case.portal_case_id.clone().ok_or_else(|| {
        JobError::Invalid(format!("case {case_id} has no portal case id to poll"))
    })?;

    let pack = ctx.loader.load(&case.ahj_key)?;
    let definition = pack.permit_type(&case.permit_type).ok_or_else(|| {
        JobError::Invalid(format!(
            "permit type '{}' missing from pack {}",
            case.permit_type, case.ahj_key
        ))
    })?;
    let driver_id = definition.submission.portal_driver.as_deref().ok_or_else(|| {
        JobError::Invalid(format!(
            "permit type '{}' has no portal driver",
            case.permit_type
        ))
    })?;
    let driver = ctx.drivers.get(driver_id)?;

    let status = driver.poll_status(&portal_case_id).await?;
    let Some(mapped) = map_portal_status(&status.status) else {
        tracing::warn!(
            case = %case_id,
            portal_status = %status.status,
            "unrecognized portal status; leaving case unchanged"
        );
        return Ok(());
    };

    if mapped == case.status {
        return Ok(());
    }

    ctx.store.update_case_with_event(
        case.id,
        CasePatch::status(mapped),
        &|before, after| {
            AuditEvent::record(
                before.org_id,
                "PermitCase",
                before.id,
                "system",
                "STATUS_UPDATED",
                Some(before),
                Some(after),
            )
        },
    )?;

    tracing::info!(case = %case_id, status = %mapped, "case status updated from portal");
    Ok(())
}

async fn schedule_inspection(
    ctx: &JobContext,
    case_id: CaseId,
    inspection_type: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<(), JobError> {
    let case = ctx.store.get_case(case_id)?;
    let pack = ctx.loader.load(&case.ahj_key)?;
    let rule = pack.inspection_rule(inspection_type).ok_or_else(|| {
        JobError::Invalid(format!(
            "inspection type '{inspection_type}' is not offered by {}",
            case.ahj_key
        ))
    })?;

    if let Some(window) = &rule.scheduling_window {
        let today = Utc::now().date_naive();
        if !window.allows(today, window_start) {
            return Err(JobError::Invalid(format!(
                "requested start {window_start} is outside the '{inspection_type}' scheduling window"
            )));
        }
    }

    let passed: Vec<String> = ctx
        .store
        .inspections_for_case(case_id)
        .into_iter()
        .filter(|record| record.result == Some(InspectionResult::Pass))
        .map(|record| record.inspection_type)
        .collect();
    for prerequisite in &rule.prerequisites {
        if !passed.contains(prerequisite) {
            return Err(JobError::Invalid(format!(
                "prerequisite inspection '{prerequisite}' has not passed"
            )));
        }
    }

    // Book through the portal when the case has one; otherwise the
    // request is recorded locally and handled out of band.
    let confirmation_id = match (
        pack.permit_type(&case.permit_type)
            .and_then(|definition| definition.submission.portal_driver.as_deref()),
        case.portal_case_id.as_deref(),
    ) {
        (Some(driver_id), Some(portal_case_id)) => {
            let driver = ctx.drivers.get(driver_id)?;
            let confirmation = driver
                .request_inspection(
                    portal_case_id,
                    &InspectionRequest {
                        inspection_type: inspection_type.to_string(),
                        window_start,
                        window_end,
                    },
                )
                .await?;
            Some(confirmation.confirmation_id)
        }
        _ => None,
    };

    let now = Utc::now();
    let record = ctx.store.create_inspection(InspectionRecord {
        id: InspectionId::new(),
        case_id,
        inspection_type: inspection_type.to_string(),
        requested_at: Some(now),
        scheduled_for: Some(window_start.and_time(NaiveTime::MIN).and_utc()),
        result: None,
        notes: None,
        created_at: now,
    })?;

    let event = AuditEvent::record::<(), serde_json::Value>(
        case.org_id,
        "Inspection",
        record.id,
        "system",
        "INSPECTION_SCHEDULED",
        None,
        Some(&serde_json::json!({
            "inspection": record,
            "confirmationId": confirmation_id,
        })),
    );
    ctx.store.append_event(event)?;

    tracing::info!(
        case = %case_id,
        inspection_type,
        ?confirmation_id,
        "inspection scheduled"
    );
    Ok(())
}
