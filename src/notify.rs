//! Outbound payment notifications.
//!
//! The lifecycle engine emits `PaymentNotice` events onto a queue and
//! moves on; this component consumes the queue and writes one inbox
//! document per notice. At-most-once, no retry: a failed delivery is
//! logged and never touches the batch or the other notices.
use crate::batch::TimeStamp;
use crate::gateway::DocumentStore;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One settled payment, addressed to a citizen's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub aadhaar: String,
    pub batch_id: String,
    pub scheme_name: String,
    pub amount: u64,
    pub utr: String,
    pub date: TimeStamp<Utc>,
}

/// The persisted inbox document.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    #[n(0)]
    pub title: String,
    #[n(1)]
    pub message: String,
    #[n(2)]
    pub amount: u64,
    #[n(3)]
    pub scheme: String,
    #[n(4)]
    pub date: TimeStamp<Utc>,
    #[n(5)]
    pub kind: String,
    #[n(6)]
    pub read: bool,
    #[n(7)]
    pub utr: String,
}

pub fn inbox_collection(aadhaar: &str) -> String {
    format!("citizens/{aadhaar}/notifications")
}

pub struct Notifier {
    store: DocumentStore,
    notices: mpsc::UnboundedReceiver<PaymentNotice>,
}

impl Notifier {
    pub fn new(store: DocumentStore, notices: mpsc::UnboundedReceiver<PaymentNotice>) -> Self {
        Self { store, notices }
    }

    /// Drain the queue until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(notice) = self.notices.recv().await {
            match self.deliver(&notice) {
                Ok(_) => debug!(citizen = %notice.aadhaar, utr = %notice.utr, "payment notice delivered"),
                Err(err) => {
                    warn!(citizen = %notice.aadhaar, batch = %notice.batch_id, %err,
                        "failed to deliver payment notice")
                }
            }
        }
    }

    /// Write one inbox document. Returns the assigned document id.
    pub fn deliver(&self, notice: &PaymentNotice) -> anyhow::Result<String> {
        let message = InboxMessage {
            title: "Payment Received".to_string(),
            message: format!(
                "You have received a payment of ₹{} for {}.",
                notice.amount, notice.scheme_name
            ),
            amount: notice.amount,
            scheme: notice.scheme_name.clone(),
            date: notice.date.clone(),
            kind: "PAYMENT_RECEIVED".to_string(),
            read: false,
            utr: notice.utr.clone(),
        };
        self.store
            .create(&inbox_collection(&notice.aadhaar), &message)
    }
}
