//! The unified error taxonomy exposed to calling surfaces
//!
//! Exactly five kinds. The first four are terminal for the caller's current
//! request: they reflect bad input or a business-rule violation, never a
//! transient fault. `Conflict` is the one kind meant to be retried
//! transparently by the orchestration layer (re-read, re-validate,
//! re-apply). Domain and store errors classify into these kinds via the
//! `From` impls below; nothing is ever swallowed.

use thiserror::Error;

use domain_billing::BillingError;
use domain_claims::ClaimError;
use infra_store::StoreError;

/// Operation errors surfaced to calling surfaces
#[derive(Debug, Error)]
pub enum OpsError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document's current status forbids the mutation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The claim action is not defined for the claim's current status
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A referenced document does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Per-document serialization detected a stale write
    #[error("Concurrent modification of {document}; re-read and retry")]
    Conflict { document: String },
}

impl OpsError {
    /// True only for `Conflict`, the kind the orchestration layer retries
    pub fn is_retriable(&self) -> bool {
        matches!(self, OpsError::Conflict { .. })
    }
}

impl From<BillingError> for OpsError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Tax(_)
            | BillingError::Money(_)
            | BillingError::EmptyInvoice
            | BillingError::InvalidLine { .. }
            | BillingError::QuantityNotPositive { .. }
            | BillingError::LineSubtotalMismatch { .. }
            | BillingError::NonPositiveAmount { .. }
            | BillingError::Overpayment { .. }
            | BillingError::MissingTransactionId { .. }
            | BillingError::PaymentNotAllowed { .. }
            | BillingError::CreditNotAllowed { .. }
            | BillingError::CreditExceedsBillable { .. }
            | BillingError::CreditExceedsBalance { .. } => OpsError::Validation(err.to_string()),

            BillingError::LineItemsFrozen { .. }
            | BillingError::AlreadyIssued { .. }
            | BillingError::InvoiceNotIssued { .. }
            | BillingError::CannotCancel { .. }
            | BillingError::SettlementNotApplicable { .. }
            | BillingError::CreditNoteFinal { .. }
            | BillingError::DocumentInvoiceMismatch { .. }
            | BillingError::BalanceCacheDiverged { .. } => OpsError::InvalidState(err.to_string()),
        }
    }
}

impl From<ClaimError> for OpsError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InvalidTransition { .. } => OpsError::InvalidTransition(err.to_string()),

            ClaimError::Money(_)
            | ClaimError::NonPositiveClaim { .. }
            | ClaimError::ClaimExceedsInvoice { .. }
            | ClaimError::CoverageOutOfRange { .. }
            | ClaimError::NoDocumentsAttached
            | ClaimError::NoNewDocuments
            | ClaimError::ApprovedAmountOutOfRange { .. } => OpsError::Validation(err.to_string()),

            ClaimError::ClaimFinal { .. } | ClaimError::NotApproved { .. } => {
                OpsError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<StoreError> for OpsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvoiceNotFound(id) => OpsError::NotFound {
                entity: "invoice",
                id,
            },
            StoreError::CreditNoteNotFound(id) => OpsError::NotFound {
                entity: "credit note",
                id,
            },
            StoreError::ClaimNotFound(id) => OpsError::NotFound { entity: "claim", id },
            StoreError::DuplicateDocumentNumber(_) => OpsError::Validation(err.to_string()),
            StoreError::VersionConflict { document, .. } => OpsError::Conflict { document },
            StoreError::ForeignDocument { .. } => OpsError::InvalidState(err.to_string()),
        }
    }
}

impl From<core_kernel::TaxError> for OpsError {
    fn from(err: core_kernel::TaxError) -> Self {
        OpsError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for OpsError {
    fn from(err: validator::ValidationErrors) -> Self {
        OpsError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retriable() {
        assert!(OpsError::Conflict {
            document: "INV-000001".into()
        }
        .is_retriable());
        assert!(!OpsError::Validation("bad".into()).is_retriable());
        assert!(!OpsError::NotFound {
            entity: "invoice",
            id: "x".into()
        }
        .is_retriable());
    }

    #[test]
    fn test_version_conflict_classification() {
        let err = StoreError::VersionConflict {
            document: "INV-000001".into(),
            expected: 1,
            actual: 2,
        };
        assert!(matches!(OpsError::from(err), OpsError::Conflict { .. }));
    }

    #[test]
    fn test_overpayment_classifies_as_validation() {
        let err = BillingError::Overpayment {
            attempted: 10_000.into(),
            balance: 9_160.into(),
        };
        assert!(matches!(OpsError::from(err), OpsError::Validation(_)));
    }

    #[test]
    fn test_claim_transition_classification() {
        let err = ClaimError::InvalidTransition {
            from: "APPROVED".into(),
            action: "REJECT".into(),
        };
        assert!(matches!(
            OpsError::from(err),
            OpsError::InvalidTransition(_)
        ));
    }
}
