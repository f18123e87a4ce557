//! Static pre-submit checks on a batch draft's composition.
//!
//! A pure gate: the caller runs this before create/submit and must not
//! proceed while `errors` is non-empty. Warnings are informational only.
use crate::draft::BatchDraft;
use crate::error::PfmsError;

/// Batches over ₹1 crore draw a scrutiny warning. Whole rupees.
pub const LARGE_BATCH_THRESHOLD: u64 = 10_000_000;
pub const MIN_ACCOUNT_NUMBER_LEN: usize = 9;
pub const IFSC_LEN: usize = 11;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convenience for callers gating create/submit.
    pub fn ensure_clean(&self) -> Result<(), PfmsError> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(PfmsError::Validation(self.errors.clone()))
        }
    }
}

pub fn validate_draft(draft: &BatchDraft) -> ValidationReport {
    let mut report = ValidationReport::default();

    if draft.beneficiaries.is_empty() {
        report
            .errors
            .push("Batch must contain at least one beneficiary.".to_string());
    }

    // Summed in u128 so an adversarial draft cannot overflow the check.
    let total: u128 = draft.beneficiaries.iter().map(|b| b.amount as u128).sum();
    if total > LARGE_BATCH_THRESHOLD as u128 {
        report.warnings.push(
            "Total batch amount exceeds ₹1 Crore. Additional scrutiny required.".to_string(),
        );
    }

    for (index, b) in draft.beneficiaries.iter().enumerate() {
        if b.account_number.len() < MIN_ACCOUNT_NUMBER_LEN {
            report.errors.push(format!(
                "Beneficiary #{} ({}) has invalid account number.",
                index + 1,
                b.name
            ));
        }
        if b.ifsc.len() != IFSC_LEN {
            report.errors.push(format!(
                "Beneficiary #{} ({}) has invalid IFSC code.",
                index + 1,
                b.name
            ));
        }
    }

    report
}
