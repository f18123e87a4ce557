//! UI-facing cache of batch summaries.
//!
//! Holds a possibly stale copy for display plus the currently open
//! batch; it is never the source of truth and is only mutated with the
//! results of completed gateway operations.
use crate::batch::{Batch, BatchStatus, TimeStamp};
use crate::service::BatchUpdate;
use chrono::Utc;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub id: String,
    pub name: String,
    pub scheme_name: String,
    pub status: BatchStatus,
    pub total_amount: u64,
    pub beneficiary_count: usize,
    pub created_at: TimeStamp<Utc>,
}

impl From<&Batch> for BatchSummary {
    fn from(batch: &Batch) -> Self {
        Self {
            id: batch.id.clone(),
            name: batch.name.clone(),
            scheme_name: batch.scheme_name.clone(),
            status: batch.status,
            total_amount: batch.total_amount,
            beneficiary_count: batch.beneficiaries.len(),
            created_at: batch.created_at.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchBoard {
    summaries: HashMap<String, BatchSummary>,
    open_batch: Option<String>,
}

impl BatchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached summary with a full batch from the engine.
    pub fn upsert(&mut self, batch: &Batch) {
        self.summaries.insert(batch.id.clone(), batch.into());
    }

    /// Merge a partial approval result. Only the changed fields apply;
    /// an update for an unknown batch is ignored (the caller should
    /// re-fetch instead).
    pub fn merge(&mut self, update: &BatchUpdate) {
        if let Some(summary) = self.summaries.get_mut(&update.id) {
            summary.status = update.status;
        }
    }

    pub fn open(&mut self, id: &str) {
        if self.summaries.contains_key(id) {
            self.open_batch = Some(id.to_string());
        }
    }

    pub fn close(&mut self) {
        self.open_batch = None;
    }

    pub fn open_batch(&self) -> Option<&BatchSummary> {
        self.open_batch
            .as_ref()
            .and_then(|id| self.summaries.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&BatchSummary> {
        self.summaries.get(id)
    }

    /// Summaries for display, newest first.
    pub fn summaries(&self) -> Vec<&BatchSummary> {
        let mut rows: Vec<&BatchSummary> = self.summaries.values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}
