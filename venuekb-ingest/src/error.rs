use thiserror::Error;
use uuid::Uuid;
use venuekb_core::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unknown pass '{0}' (expected one of: pricing, capacity, policies, amenities, brand_voice, handoff)")]
    UnknownPass(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Knowledge entry {0} is not pending review")]
    NotPending(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Validation failures reject the whole invocation before any write.
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::UnknownPass(_) | IngestError::Validation(_))
    }
}
