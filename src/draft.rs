//! Draft construction for new disbursement batches
use crate::batch::Allocation;
use crate::error::PfmsError;
use crate::lookup::BeneficiaryCandidate;

// Used for constructing batches before they are persisted.
// No id field; the gateway assigns one on create.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchDraft {
    pub name: String,
    pub scheme_id: String,
    pub scheme_name: String,
    pub beneficiaries: Vec<Allocation>,
}

impl BatchDraft {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn set_scheme(mut self, scheme_id: &str, scheme_name: &str) -> Self {
        self.scheme_id = scheme_id.to_string();
        self.scheme_name = scheme_name.to_string();
        self
    }

    /// Add a payee from a lookup candidate. Bank details are copied in
    /// as a snapshot and the amount defaults to the candidate's
    /// eligible amount.
    pub fn add_candidate(mut self, candidate: &BeneficiaryCandidate) -> Self {
        self.beneficiaries.push(Allocation::new(
            candidate.citizen_id.clone(),
            Some(candidate.aadhaar.clone()),
            candidate.name.clone(),
            candidate.account_number.clone(),
            candidate.ifsc.clone(),
            candidate.eligible_amount,
        ));
        self
    }

    pub fn add_beneficiary(mut self, allocation: Allocation) -> Self {
        self.beneficiaries.push(allocation);
        self
    }

    /// Override one payee's amount before submission. Out-of-range
    /// positions are ignored.
    pub fn set_amount(mut self, position: usize, amount: u64) -> Self {
        if let Some(allocation) = self.beneficiaries.get_mut(position) {
            allocation.amount = amount;
        }
        self
    }

    /// Checked sum of all allocation amounts. This is money, so an
    /// overflow is an error, not a wrap.
    pub fn total_amount(&self) -> Result<u64, PfmsError> {
        self.beneficiaries
            .iter()
            .try_fold(0u64, |sum, b| sum.checked_add(b.amount))
            .ok_or(PfmsError::AmountOverflow)
    }
}
