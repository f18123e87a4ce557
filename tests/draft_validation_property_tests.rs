//! Property-based tests for batch draft validation.
//!
//! Uses proptest to verify the validation rules across randomly
//! generated drafts: valid drafts are clean, each malformed payee is
//! flagged by position and name, the large-amount threshold warns
//! without blocking, and validation never mutates its input.

use proptest::prelude::*;
use pfms_batch::{
    batch::Allocation,
    draft::BatchDraft,
    rules::{self, LARGE_BATCH_THRESHOLD},
};

// PROPERTY TEST STRATEGIES

/// Strategy for well-formed account numbers (9 to 18 digits)
fn valid_account_strategy() -> impl Strategy<Value = String> {
    "[0-9]{9,18}"
}

/// Strategy for malformed account numbers (too short)
fn short_account_strategy() -> impl Strategy<Value = String> {
    "[0-9]{0,8}"
}

/// Strategy for well-formed 11-character IFSC codes
fn valid_ifsc_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{4}0[A-Z0-9]{6}"
}

/// Strategy for IFSC codes of the wrong length (at most 10 chars)
fn short_ifsc_strategy() -> impl Strategy<Value = String> {
    "[A-Z0-9]{0,10}"
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z]{2,12}"
}

/// Amounts small enough that no draft trips the scrutiny threshold
fn modest_amount_strategy() -> impl Strategy<Value = u64> {
    1u64..=9_999u64
}

fn valid_allocation_strategy() -> impl Strategy<Value = Allocation> {
    (
        name_strategy(),
        valid_account_strategy(),
        valid_ifsc_strategy(),
        modest_amount_strategy(),
    )
        .prop_map(|(name, account, ifsc, amount)| {
            Allocation::new(
                format!("citizen_{name}"),
                None,
                name,
                account,
                ifsc,
                amount,
            )
        })
}

fn draft_from(allocations: Vec<Allocation>) -> BatchDraft {
    allocations
        .into_iter()
        .fold(BatchDraft::new().set_name("prop run"), |draft, allocation| {
            draft.add_beneficiary(allocation)
        })
}

// PROPERTY TESTS
proptest! {
    /// Property: drafts whose payees are all well-formed produce no errors
    #[test]
    fn prop_valid_drafts_are_clean(
        allocations in prop::collection::vec(valid_allocation_strategy(), 1..5)
    ) {
        let report = rules::validate_draft(&draft_from(allocations));

        prop_assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
        prop_assert!(report.warnings.is_empty());
        prop_assert!(report.ensure_clean().is_ok());
    }

    /// Property: a too-short account number is always flagged, naming the
    /// payee by 1-based position and name
    #[test]
    fn prop_short_account_number_is_flagged(
        mut allocations in prop::collection::vec(valid_allocation_strategy(), 1..4),
        bad_account in short_account_strategy(),
    ) {
        let position = allocations.len();
        let mut bad = allocations[0].clone();
        bad.name = "Mangled".to_string();
        bad.account_number = bad_account;
        allocations.push(bad);

        let report = rules::validate_draft(&draft_from(allocations));

        let expected = format!("Beneficiary #{} (Mangled) has invalid account number.", position + 1);
        prop_assert!(report.errors.contains(&expected), "errors were {:?}", report.errors);
    }

    /// Property: an IFSC of any length other than 11 is always flagged
    #[test]
    fn prop_wrong_length_ifsc_is_flagged(
        name in name_strategy(),
        account in valid_account_strategy(),
        bad_ifsc in short_ifsc_strategy(),
        amount in modest_amount_strategy(),
    ) {
        let draft = draft_from(vec![Allocation::new(
            "citizen_1prop".into(),
            None,
            name.clone(),
            account,
            bad_ifsc,
            amount,
        )]);

        let report = rules::validate_draft(&draft);

        let expected = format!("Beneficiary #1 ({name}) has invalid IFSC code.");
        prop_assert!(report.errors.contains(&expected));
    }

    /// Property: totals over the threshold warn and never error (for an
    /// otherwise well-formed draft)
    #[test]
    fn prop_large_totals_warn_without_blocking(
        name in name_strategy(),
        account in valid_account_strategy(),
        ifsc in valid_ifsc_strategy(),
        excess in 1u64..=LARGE_BATCH_THRESHOLD,
    ) {
        let draft = draft_from(vec![Allocation::new(
            "citizen_1prop".into(),
            None,
            name,
            account,
            ifsc,
            LARGE_BATCH_THRESHOLD + excess,
        )]);

        let report = rules::validate_draft(&draft);

        prop_assert!(report.errors.is_empty());
        prop_assert_eq!(report.warnings.len(), 1);
    }

    /// Property: validation is a pure function of the draft and never
    /// mutates it, valid or not
    #[test]
    fn prop_validation_never_mutates_its_input(
        allocations in prop::collection::vec(
            prop_oneof![
                valid_allocation_strategy(),
                (name_strategy(), short_account_strategy(), short_ifsc_strategy())
                    .prop_map(|(name, account, ifsc)| Allocation::new(
                        format!("citizen_{name}"), None, name, account, ifsc, 100,
                    )),
            ],
            0..5,
        )
    ) {
        let draft = draft_from(allocations);
        let snapshot = draft.clone();

        let _report = rules::validate_draft(&draft);

        prop_assert_eq!(draft, snapshot);
    }

    /// Property: the checked total equals the plain sum of amounts for
    /// any draft that fits in u64
    #[test]
    fn prop_total_matches_sum(
        allocations in prop::collection::vec(valid_allocation_strategy(), 0..6)
    ) {
        let expected: u64 = allocations.iter().map(|b| b.amount).sum();
        let draft = draft_from(allocations);

        prop_assert_eq!(draft.total_amount().unwrap(), expected);
    }

    /// Property: an empty draft always errors, whatever its labels
    #[test]
    fn prop_empty_drafts_always_error(name in name_strategy()) {
        let draft = BatchDraft::new().set_name(&name);

        let report = rules::validate_draft(&draft);

        prop_assert!(!report.is_clean());
    }
}
