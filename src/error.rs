use crate::batch::BatchStatus;

#[derive(thiserror::Error, Debug)]
pub enum PfmsError {
    #[error("{collection} document not found: {id}")]
    NotFound { collection: String, id: String },
    #[error("batch {id} is {found} but {action} requires {expected}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        expected: &'static str,
        found: BatchStatus,
    },
    #[error("draft failed validation: {}", .0.join(" "))]
    Validation(Vec<String>),
    #[error("batch {id}: transition abandoned after repeated write conflicts")]
    Conflict { id: String },
    #[error("total amount overflows the rupee range")]
    AmountOverflow,
}
