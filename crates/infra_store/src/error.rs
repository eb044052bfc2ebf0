//! Store errors

use thiserror::Error;

/// Errors raised by the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Credit note not found: {0}")]
    CreditNoteNotFound(String),

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    /// Document numbers are unique across the store
    #[error("Duplicate document number: {0}")]
    DuplicateDocumentNumber(String),

    /// The writer read a version that is no longer current; re-read and retry
    #[error("Stale write to {document}: expected version {expected}, found {actual}")]
    VersionConflict {
        document: String,
        expected: u64,
        actual: u64,
    },

    /// A log entry was committed against a different invoice than it references
    #[error("{document} does not belong to invoice {invoice}")]
    ForeignDocument { document: String, invoice: String },
}

impl StoreError {
    /// True for the one error kind a caller should retry after re-reading
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
