//! Claims domain errors

use core_kernel::MoneyError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Claim amount must be positive, got {amount}")]
    NonPositiveClaim { amount: Decimal },

    #[error("Claim amount {claim} exceeds invoice total {invoice_total}")]
    ClaimExceedsInvoice {
        claim: Decimal,
        invoice_total: Decimal,
    },

    #[error("Coverage percentage {percentage} must lie between 0 and 100")]
    CoverageOutOfRange { percentage: Decimal },

    /// The action is not defined for the claim's current status
    #[error("Action {action} is not available from status {from}")]
    InvalidTransition { from: String, action: String },

    #[error("At least one supporting document must be attached before TPA submission")]
    NoDocumentsAttached,

    #[error("Resubmission requires documents attached after the information request")]
    NoNewDocuments,

    #[error("Approved amount {approved} must be positive and not exceed claim amount {claim}")]
    ApprovedAmountOutOfRange { approved: Decimal, claim: Decimal },

    /// Approved and Rejected claims are immutable
    #[error("Claim is final in status {status}")]
    ClaimFinal { status: String },

    #[error("Claim has not been approved (status {status})")]
    NotApproved { status: String },
}
