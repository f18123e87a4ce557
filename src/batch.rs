//! Core disbursement batch aggregate and audit trail types
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Lifecycle states for a disbursement batch.
///
/// `PendingApproval1` is part of the reporting vocabulary but no
/// transition currently produces it: level-1 approval moves a
/// `Validated` batch straight to `PendingApproval2`. Flagged for
/// product clarification rather than patched over.
/// `Failed` is reached only when the PFMS round trip times out.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    #[n(0)]
    Draft,
    #[n(1)]
    Validated,
    #[n(2)]
    PendingApproval1,
    #[n(3)]
    PendingApproval2,
    #[n(4)]
    Approved,
    #[n(5)]
    Processing,
    #[n(6)]
    Processed,
    #[n(7)]
    Failed,
}

impl BatchStatus {
    /// Stable wire tag, matches the persisted vocabulary.
    pub fn tag(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "DRAFT",
            BatchStatus::Validated => "VALIDATED",
            BatchStatus::PendingApproval1 => "PENDING_APPROVAL_1",
            BatchStatus::PendingApproval2 => "PENDING_APPROVAL_2",
            BatchStatus::Approved => "APPROVED",
            BatchStatus::Processing => "PROCESSING",
            BatchStatus::Processed => "PROCESSED",
            BatchStatus::Failed => "FAILED",
        }
    }

    /// Human-readable label for dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Draft => "Draft",
            BatchStatus::Validated => "Validated",
            BatchStatus::PendingApproval1 => "Pending Approval 1",
            BatchStatus::PendingApproval2 => "Pending Approval 2",
            BatchStatus::Approved => "Approved",
            BatchStatus::Processing => "Processing",
            BatchStatus::Processed => "Processed",
            BatchStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    #[n(0)]
    Created,
    #[n(1)]
    Validated,
    #[n(2)]
    ApprovedLevel1,
    #[n(3)]
    ApprovedLevel2,
    #[n(4)]
    SubmittedToPfms,
    #[n(5)]
    PaymentProcessed,
    #[n(6)]
    PaymentFailed,
}

impl AuditAction {
    pub fn tag(&self) -> &'static str {
        match self {
            AuditAction::Created => "CREATED",
            AuditAction::Validated => "VALIDATED",
            AuditAction::ApprovedLevel1 => "APPROVED_LEVEL_1",
            AuditAction::ApprovedLevel2 => "APPROVED_LEVEL_2",
            AuditAction::SubmittedToPfms => "SUBMITTED_TO_PFMS",
            AuditAction::PaymentProcessed => "PAYMENT_PROCESSED",
            AuditAction::PaymentFailed => "PAYMENT_FAILED",
        }
    }
}

/// The identity performing an operation. Passed explicitly into every
/// engine operation; nothing reads an ambient session.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    #[n(0)]
    Officer(#[n(0)] String),
    /// Sentinel for an unauthenticated caller.
    #[n(1)]
    Anonymous,
    /// Sentinel for automated settlement steps.
    #[n(2)]
    PfmsGateway,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Officer(id) => f.write_str(id),
            Actor::Anonymous => f.write_str("anonymous"),
            Actor::PfmsGateway => f.write_str("PFMS Gateway (Simulated)"),
        }
    }
}

/// Immutable log record of one lifecycle transition.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    #[n(0)]
    pub action: AuditAction,
    #[n(1)]
    pub actor: Actor,
    #[n(2)]
    pub timestamp: TimeStamp<Utc>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    #[n(0)]
    Credited,
}

/// A payee line item inside a batch. Bank details are a snapshot taken
/// when the beneficiary is added; later edits to the citizen record do
/// not reach an existing batch.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    #[n(0)]
    pub beneficiary_id: String,
    /// Citizen reference used for inbox notifications, when known.
    #[n(1)]
    pub aadhaar: Option<String>,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub account_number: String,
    #[n(4)]
    pub ifsc: String,
    /// Whole rupees. Integers for currency.
    #[n(5)]
    pub amount: u64,
    // Settlement fields stay absent until the PFMS round trip succeeds.
    #[n(6)]
    pub payment_status: Option<PaymentStatus>,
    #[n(7)]
    pub utr: Option<String>,
    #[n(8)]
    pub payment_date: Option<TimeStamp<Utc>>,
}

impl Allocation {
    pub fn new(
        beneficiary_id: String,
        aadhaar: Option<String>,
        name: String,
        account_number: String,
        ifsc: String,
        amount: u64,
    ) -> Self {
        Self {
            beneficiary_id,
            aadhaar,
            name,
            account_number,
            ifsc,
            amount,
            payment_status: None,
            utr: None,
            payment_date: None,
        }
    }
}

/// A unit of disbursement work: one scheme, a set of payee allocations,
/// and the append-only audit trail of everything done to it.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    #[n(0)]
    pub id: String, // uuid7, bech32 "batch_" prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub scheme_id: String,
    #[n(3)]
    pub scheme_name: String,
    #[n(4)]
    pub beneficiaries: Vec<Allocation>,
    /// Sum of allocation amounts at creation time. Not recomputed
    /// afterwards.
    #[n(5)]
    pub total_amount: u64,
    #[n(6)]
    pub status: BatchStatus,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
    #[n(8)]
    pub created_by: Actor,
    #[n(9)]
    pub audit_trail: Vec<AuditEntry>,
}

impl Batch {
    /// Append an audit entry. The trail only ever grows; entries are
    /// never edited or removed.
    pub fn record(&mut self, action: AuditAction, actor: Actor) {
        self.audit_trail.push(AuditEntry {
            action,
            actor,
            timestamp: TimeStamp::new(),
        });
    }

    pub fn audit_count(&self, action: AuditAction) -> usize {
        self.audit_trail
            .iter()
            .filter(|entry| entry.action == action)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeZone> Eq for TimeStamp<T> {}

impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
