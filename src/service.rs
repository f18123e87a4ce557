//! Service layer API for the disbursement batch lifecycle.
//!
//! Every mutating operation is a read → precondition check →
//! compare-and-swap loop over the whole encoded batch document, so a
//! transition either lands atomically (status, beneficiary list, and
//! audit entry together) or leaves the batch untouched. A CAS loser
//! re-reads and re-checks, which is what makes concurrent duplicate
//! approvals come out as one success and one typed rejection.
use crate::batch::{Actor, AuditAction, Batch, BatchStatus, PaymentStatus, TimeStamp};
use crate::draft::BatchDraft;
use crate::error::PfmsError;
use crate::gateway::DocumentStore;
use crate::notify::PaymentNotice;
use crate::rules::{self, ValidationReport};
use crate::utils;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{info, warn};

pub const BATCHES: &str = "pfms_batches";

const CAS_RETRY_LIMIT: usize = 8;

/// Simulated PFMS round-trip timing. Injectable so tests can shrink
/// the wait or force the timeout path.
#[derive(Debug, Clone, Copy)]
pub struct PfmsTiming {
    pub latency: Duration,
    pub timeout: Duration,
}

impl Default for PfmsTiming {
    fn default() -> Self {
        Self {
            latency: Duration::from_secs(3),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Partial result of an approval: id plus the changed fields, for the
/// caller to merge into its cache rather than replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdate {
    pub id: String,
    pub status: BatchStatus,
    pub audit_trail: Vec<crate::batch::AuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub success: bool,
    pub batch: Batch,
}

pub struct BatchService {
    store: DocumentStore,
    notices: mpsc::UnboundedSender<PaymentNotice>,
    timing: PfmsTiming,
}

impl BatchService {
    pub fn new(store: DocumentStore, notices: mpsc::UnboundedSender<PaymentNotice>) -> Self {
        Self {
            store,
            notices,
            timing: PfmsTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: PfmsTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Persist a new DRAFT batch. No content validation happens here;
    /// `validate_draft` is a separate gate the caller runs first, and a
    /// zero-beneficiary batch is creatable.
    pub fn create_batch(&self, draft: BatchDraft, actor: Actor) -> anyhow::Result<Batch> {
        let total_amount = draft.total_amount()?;
        let id = utils::new_uuid_to_bech32("batch_")?;

        let mut batch = Batch {
            id: id.clone(),
            name: draft.name,
            scheme_id: draft.scheme_id,
            scheme_name: draft.scheme_name,
            beneficiaries: draft.beneficiaries,
            total_amount,
            status: BatchStatus::Draft,
            created_at: TimeStamp::new(),
            created_by: actor.clone(),
            audit_trail: vec![],
        };
        batch.record(AuditAction::Created, actor);

        self.store.insert(BATCHES, &id, &batch)?;
        info!(batch = %id, total = total_amount, beneficiaries = batch.beneficiaries.len(),
            "created disbursement batch");
        Ok(batch)
    }

    pub fn get_batch(&self, id: &str) -> anyhow::Result<Batch> {
        self.store.get(BATCHES, id)
    }

    /// All batches, newest first.
    pub fn list_batches(&self) -> anyhow::Result<Vec<Batch>> {
        let mut batches: Vec<Batch> = self.store.list(BATCHES)?;
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    /// The pure pre-submit gate, re-exported on the service surface.
    pub fn validate_draft(&self, draft: &BatchDraft) -> ValidationReport {
        rules::validate_draft(draft)
    }

    /// Flip a DRAFT batch to VALIDATED. Content checks live in the
    /// draft gate, not here. Re-validating a VALIDATED batch is a
    /// no-op, so the trail never collects duplicate VALIDATED entries.
    pub fn validate_batch(&self, id: &str, actor: Actor) -> anyhow::Result<Batch> {
        let batch = self.transition(id, |current| match current.status {
            BatchStatus::Validated => Ok(None),
            BatchStatus::Draft => {
                let mut next = current.clone();
                next.status = BatchStatus::Validated;
                next.record(AuditAction::Validated, actor.clone());
                Ok(Some(next))
            }
            found => Err(PfmsError::InvalidTransition {
                id: current.id.clone(),
                action: "validate",
                expected: "DRAFT",
                found,
            }
            .into()),
        })?;
        info!(batch = %id, status = %batch.status, "batch validated");
        Ok(batch)
    }

    /// Level 1 moves VALIDATED to PENDING_APPROVAL_2; level 2 moves
    /// PENDING_APPROVAL_2 to APPROVED. The prior state is enforced
    /// here, not trusted to the caller's UI.
    pub fn approve_batch(&self, id: &str, level: u8, actor: Actor) -> anyhow::Result<BatchUpdate> {
        let (expected, next_status, action) = match level {
            1 => (
                BatchStatus::Validated,
                BatchStatus::PendingApproval2,
                AuditAction::ApprovedLevel1,
            ),
            2 => (
                BatchStatus::PendingApproval2,
                BatchStatus::Approved,
                AuditAction::ApprovedLevel2,
            ),
            other => return Err(anyhow::anyhow!("approval level must be 1 or 2, got {other}")),
        };

        let batch = self.transition(id, |current| {
            if current.status != expected {
                return Err(PfmsError::InvalidTransition {
                    id: current.id.clone(),
                    action: "approve",
                    expected: expected.tag(),
                    found: current.status,
                }
                .into());
            }
            let mut next = current.clone();
            next.status = next_status;
            next.record(action, actor.clone());
            Ok(Some(next))
        })?;
        info!(batch = %id, level, status = %batch.status, "batch approved");

        Ok(BatchUpdate {
            id: batch.id,
            status: batch.status,
            audit_trail: batch.audit_trail,
        })
    }

    /// Submit an APPROVED batch to the simulated PFMS gateway.
    ///
    /// Phase 1 locks the batch into PROCESSING; while the round trip is
    /// in flight every other mutation on this batch fails its
    /// precondition check, but other batches are untouched. On
    /// completion the settled beneficiary list, terminal status, and
    /// audit entry land in one atomic write, and a best-effort payment
    /// notice is queued per citizen-linked allocation. If the gateway
    /// does not answer within the timeout the batch falls back to
    /// FAILED with no settlement fields populated.
    pub async fn submit_batch(&self, id: &str, actor: Actor) -> anyhow::Result<SubmitReceipt> {
        self.transition(id, |current| {
            if current.status != BatchStatus::Approved {
                return Err(PfmsError::InvalidTransition {
                    id: current.id.clone(),
                    action: "submit",
                    expected: "APPROVED",
                    found: current.status,
                }
                .into());
            }
            let mut next = current.clone();
            next.status = BatchStatus::Processing;
            next.record(AuditAction::SubmittedToPfms, actor.clone());
            Ok(Some(next))
        })?;
        info!(batch = %id, "batch submitted to PFMS");

        // The suspension point: only this batch waits.
        let round_trip = time::timeout(self.timing.timeout, time::sleep(self.timing.latency)).await;
        if round_trip.is_err() {
            warn!(batch = %id, "PFMS gateway timed out, marking batch FAILED");
            let batch = self.transition(id, |current| {
                let mut next = current.clone();
                next.status = BatchStatus::Failed;
                next.record(AuditAction::PaymentFailed, Actor::PfmsGateway);
                Ok(Some(next))
            })?;
            return Ok(SubmitReceipt {
                success: false,
                batch,
            });
        }

        // Settle against the batch's current beneficiary list, re-read
        // inside the CAS loop rather than trusted from before the wait.
        let paid_at = TimeStamp::new();
        let batch = self.transition(id, |current| {
            if current.status != BatchStatus::Processing {
                return Err(PfmsError::InvalidTransition {
                    id: current.id.clone(),
                    action: "settle",
                    expected: "PROCESSING",
                    found: current.status,
                }
                .into());
            }
            let mut next = current.clone();
            for allocation in &mut next.beneficiaries {
                allocation.payment_status = Some(PaymentStatus::Credited);
                allocation.utr = Some(utils::new_utr());
                allocation.payment_date = Some(paid_at.clone());
            }
            next.status = BatchStatus::Processed;
            next.record(AuditAction::PaymentProcessed, Actor::PfmsGateway);
            Ok(Some(next))
        })?;
        info!(batch = %id, beneficiaries = batch.beneficiaries.len(), "batch processed");

        // Fire-and-forget notices; the batch is already PROCESSED and
        // stays that way whatever happens from here.
        for allocation in &batch.beneficiaries {
            let Some(aadhaar) = &allocation.aadhaar else {
                continue;
            };
            let notice = PaymentNotice {
                aadhaar: aadhaar.clone(),
                batch_id: batch.id.clone(),
                scheme_name: batch.scheme_name.clone(),
                amount: allocation.amount,
                utr: allocation.utr.clone().unwrap_or_default(),
                date: paid_at.clone(),
            };
            if self.notices.send(notice).is_err() {
                warn!(citizen = %aadhaar, batch = %batch.id,
                    "notification queue closed, payment notice dropped");
            }
        }

        Ok(SubmitReceipt {
            success: true,
            batch,
        })
    }

    /// Run one transition as a bounded CAS loop. `apply` returns the
    /// next document, or None when the operation is a no-op for the
    /// current state. Any error leaves the stored batch unchanged.
    fn transition<F>(&self, id: &str, mut apply: F) -> anyhow::Result<Batch>
    where
        F: FnMut(&Batch) -> anyhow::Result<Option<Batch>>,
    {
        for _ in 0..CAS_RETRY_LIMIT {
            let (raw, current): (sled::IVec, Batch) = self.store.get_raw(BATCHES, id)?;
            let Some(next) = apply(&current)? else {
                return Ok(current);
            };
            if self.store.swap(BATCHES, id, &raw, &next)? {
                return Ok(next);
            }
            // lost the race; re-read and re-check preconditions
        }
        Err(PfmsError::Conflict { id: id.to_string() }.into())
    }
}
