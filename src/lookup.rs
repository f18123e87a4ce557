//! Read-only scheme and beneficiary queries used when building a batch.
use crate::gateway::DocumentStore;

pub const SCHEMES: &str = "schemes";
pub const CITIZENS: &str = "citizens";

/// Placeholder award until per-scheme eligibility rules exist. Every
/// verified citizen is offered this flat amount; the real predicate is
/// an open product question.
pub const DEFAULT_ELIGIBLE_AMOUNT: u64 = 5_000;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub ministry: String,
    #[n(3)]
    pub description: String,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Citizen {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub aadhaar: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub account_number: String,
    #[n(4)]
    pub ifsc: String,
    /// KYC/document verification completed.
    #[n(5)]
    pub verified: bool,
}

/// A citizen offered as a disbursement candidate for a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeneficiaryCandidate {
    pub citizen_id: String,
    pub aadhaar: String,
    pub name: String,
    pub account_number: String,
    pub ifsc: String,
    pub eligible_amount: u64,
}

pub struct Directory {
    store: DocumentStore,
}

impl Directory {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn list_schemes(&self) -> anyhow::Result<Vec<Scheme>> {
        self.store.list(SCHEMES)
    }

    /// Candidates for a scheme: every verified citizen, at the flat
    /// placeholder award. Fails with NotFound if the scheme id does
    /// not resolve.
    pub fn eligible_beneficiaries(
        &self,
        scheme_id: &str,
    ) -> anyhow::Result<Vec<BeneficiaryCandidate>> {
        let _scheme: Scheme = self.store.get(SCHEMES, scheme_id)?;

        let citizens: Vec<Citizen> = self.store.list(CITIZENS)?;
        Ok(citizens
            .into_iter()
            .filter(|citizen| citizen.verified)
            .map(|citizen| BeneficiaryCandidate {
                citizen_id: citizen.id,
                aadhaar: citizen.aadhaar,
                name: citizen.name,
                account_number: citizen.account_number,
                ifsc: citizen.ifsc,
                eligible_amount: DEFAULT_ELIGIBLE_AMOUNT,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PfmsError;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn seeded_directory() -> (tempfile::TempDir, Directory) {
        let dir = tempdir().unwrap();
        let db = sled::open(dir.path().join("lookup.db")).unwrap();
        let store = DocumentStore::new(Arc::new(db));

        store
            .insert(
                SCHEMES,
                "scheme_1pension",
                &Scheme {
                    id: "scheme_1pension".into(),
                    name: "Old Age Pension".into(),
                    ministry: "Social Justice".into(),
                    description: "Monthly pension for senior citizens".into(),
                },
            )
            .unwrap();

        for (id, name, verified) in [
            ("citizen_1asha", "Asha Devi", true),
            ("citizen_1ravi", "Ravi Kumar", true),
            ("citizen_1nand", "Nand Lal", false),
        ] {
            store
                .insert(
                    CITIZENS,
                    id,
                    &Citizen {
                        id: id.into(),
                        aadhaar: format!("9999{id}"),
                        name: name.into(),
                        account_number: "911234567890".into(),
                        ifsc: "SBIN0001234".into(),
                        verified,
                    },
                )
                .unwrap();
        }

        (dir, Directory::new(store))
    }

    #[test]
    fn lists_seeded_schemes() {
        let (_dir, directory) = seeded_directory();

        let schemes = directory.list_schemes().unwrap();
        assert_eq!(schemes.len(), 1);
        assert_eq!(schemes[0].name, "Old Age Pension");
    }

    #[test]
    fn only_verified_citizens_are_candidates() {
        let (_dir, directory) = seeded_directory();

        let candidates = directory.eligible_beneficiaries("scheme_1pension").unwrap();

        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.eligible_amount == DEFAULT_ELIGIBLE_AMOUNT));
        assert!(candidates.iter().any(|c| c.name == "Asha Devi"));
        assert!(!candidates.iter().any(|c| c.name == "Nand Lal"));
    }

    #[test]
    fn unknown_scheme_is_not_found() {
        let (_dir, directory) = seeded_directory();

        let err = directory.eligible_beneficiaries("scheme_1missing").unwrap_err();
        assert!(matches!(
            err.downcast::<PfmsError>().unwrap(),
            PfmsError::NotFound { .. }
        ));
    }
}
