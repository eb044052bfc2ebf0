//! Claim adjudication workflow
//!
//! The transition table, with preconditions and side effects:
//!
//! | From             | Action       | To               | Precondition                         |
//! |------------------|--------------|------------------|--------------------------------------|
//! | Submitted        | SubmitToTpa  | SubmittedToTpa   | at least one document attached       |
//! | SubmittedToTpa   | Approve      | Approved         | 0 < approved <= claim amount         |
//! | SubmittedToTpa   | Reject       | Rejected         | -                                    |
//! | SubmittedToTpa   | RequestInfo  | InfoRequested    | -                                    |
//! | InfoRequested    | SubmitToTpa  | SubmittedToTpa   | documents attached since the request |
//!
//! Any other (status, action) pair fails with `InvalidTransition` and
//! leaves the claim untouched. Every precondition is checked before any
//! field is written, so a failed action never leaves a partial write.
//! Sending to the TPA is an explicit, separately retriable action: a failed
//! external submission fails before the transition commits and the caller
//! simply retries from the same status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::Money;

use crate::claim::{ClaimStatus, InsuranceClaim};
use crate::error::ClaimError;

/// An adjudication action against a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimAction {
    /// Send (or resend) the claim to the third-party administrator
    SubmitToTpa,
    /// Record the TPA's approval with the committed amount
    Approve { approved_amount: Money },
    /// Record the TPA's rejection
    Reject,
    /// Record that the TPA asked for more information
    RequestInfo,
}

impl ClaimAction {
    /// Action name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            ClaimAction::SubmitToTpa => "SUBMIT_TO_TPA",
            ClaimAction::Approve { .. } => "APPROVE",
            ClaimAction::Reject => "REJECT",
            ClaimAction::RequestInfo => "REQUEST_INFO",
        }
    }
}

/// Applies an action to a claim, enforcing the transition table
///
/// `at` stamps the side-effect dates (`tpa_submission_date` and friends),
/// keeping the function deterministic for callers that supply the time.
///
/// # Errors
///
/// - `InvalidTransition` for any pair outside the table
/// - `NoDocumentsAttached` / `NoNewDocuments` for submissions without
///   (fresh) paperwork
/// - `ApprovedAmountOutOfRange` for an approval outside `(0, claim_amount]`
pub fn apply_action(
    claim: &mut InsuranceClaim,
    action: ClaimAction,
    at: DateTime<Utc>,
) -> Result<(), ClaimError> {
    match (claim.status, &action) {
        (ClaimStatus::Submitted, ClaimAction::SubmitToTpa) => {
            if claim.documents.is_empty() {
                return Err(ClaimError::NoDocumentsAttached);
            }
            claim.status = ClaimStatus::SubmittedToTpa;
            claim.tpa_submission_date = Some(at);
        }
        (ClaimStatus::InfoRequested, ClaimAction::SubmitToTpa) => {
            let fresh = claim
                .info_requested_at
                .map(|since| claim.has_documents_since(since))
                .unwrap_or(false);
            if !fresh {
                return Err(ClaimError::NoNewDocuments);
            }
            claim.status = ClaimStatus::SubmittedToTpa;
            claim.tpa_submission_date = Some(at);
        }
        (ClaimStatus::SubmittedToTpa, ClaimAction::Approve { approved_amount }) => {
            if !approved_amount.is_positive()
                || approved_amount
                    .checked_sub(&claim.claim_amount)?
                    .is_positive()
            {
                return Err(ClaimError::ApprovedAmountOutOfRange {
                    approved: approved_amount.amount(),
                    claim: claim.claim_amount.amount(),
                });
            }
            claim.status = ClaimStatus::Approved;
            claim.approved_amount = Some(*approved_amount);
            claim.tpa_approval_date = Some(at);
        }
        (ClaimStatus::SubmittedToTpa, ClaimAction::Reject) => {
            claim.status = ClaimStatus::Rejected;
            claim.tpa_rejection_date = Some(at);
        }
        (ClaimStatus::SubmittedToTpa, ClaimAction::RequestInfo) => {
            claim.status = ClaimStatus::InfoRequested;
            claim.info_requested_at = Some(at);
        }
        (from, action) => {
            return Err(ClaimError::InvalidTransition {
                from: from.to_string(),
                action: action.name().to_string(),
            });
        }
    }

    claim.updated_at = at;
    info!(
        claim = %claim.claim_number,
        action = action.name(),
        status = %claim.status,
        "claim transitioned"
    );
    Ok(())
}
