//! Disbursement batch engine for a simulated DBT/PFMS pipeline:
//! drafts are built from scheme/beneficiary lookups, gated by static
//! validation rules, then driven through a two-level approval and
//! payment-processing state machine with an append-only audit trail.

pub mod batch;
pub mod board;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod lookup;
pub mod notify;
pub mod rules;
pub mod service;
pub mod utils;
