//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimId, DocumentId, InsurerId, InvoiceId, Money, PatientId, Rate};

use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Submitted internally; not yet sent to the TPA
    Submitted,
    /// With the third-party administrator for adjudication
    SubmittedToTpa,
    /// The TPA asked for more information
    InfoRequested,
    /// Approved; terminal
    Approved,
    /// Rejected; terminal
    Rejected,
}

impl ClaimStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimStatus::Submitted => "SUBMITTED",
            ClaimStatus::SubmittedToTpa => "SUBMITTED_TO_TPA",
            ClaimStatus::InfoRequested => "INFO_REQUESTED",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Rejected => "REJECTED",
        };
        write!(f, "{label}")
    }
}

/// An opaque reference to a supporting document
///
/// The core never inspects document content; the reference resolves through
/// the external document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDocument {
    /// Reference into the document store
    pub document_ref: DocumentId,
    /// Human-readable label (e.g., "Discharge summary")
    pub label: String,
    /// When the document was attached to the claim
    pub attached_at: DateTime<Utc>,
}

/// An insurance claim against one invoice
///
/// Created once per submission attempt; never deleted, only transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceClaim {
    /// Unique identifier
    pub id: ClaimId,
    /// Claim number (human-readable, unique)
    pub claim_number: String,
    /// Invoice being claimed against
    pub invoice_id: InvoiceId,
    /// Patient the invoice bills
    pub patient_id: PatientId,
    /// Insurance provider / TPA
    pub insurer_id: InsurerId,
    /// Policy number with the provider
    pub policy_number: String,
    /// Amount claimed; at most the invoice total at submission time
    pub claim_amount: Money,
    /// Coverage percentage under the policy (0-100)
    pub coverage_percentage: Rate,
    /// Amount the payer committed to; set only on approval
    pub approved_amount: Option<Money>,
    /// Status
    pub status: ClaimStatus,
    /// When the claim was submitted internally
    pub submission_date: DateTime<Utc>,
    /// When the claim was last sent to the TPA
    pub tpa_submission_date: Option<DateTime<Utc>>,
    /// When the TPA approved
    pub tpa_approval_date: Option<DateTime<Utc>>,
    /// When the TPA rejected
    pub tpa_rejection_date: Option<DateTime<Utc>>,
    /// When the TPA last asked for more information
    pub info_requested_at: Option<DateTime<Utc>>,
    /// Supporting documents
    pub documents: Vec<ClaimDocument>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl InsuranceClaim {
    /// Submits a new claim
    ///
    /// The `invoice_total` is the referenced invoice's total at submission
    /// time. It is checked once, here: invoices freeze their line items at
    /// issue, so the bound cannot drift afterwards.
    ///
    /// # Errors
    ///
    /// - `NonPositiveClaim` for a zero or negative claim amount
    /// - `ClaimExceedsInvoice` when the claim exceeds the invoice total
    /// - `CoverageOutOfRange` for a coverage percentage outside 0-100
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        claim_number: impl Into<String>,
        invoice_id: InvoiceId,
        patient_id: PatientId,
        insurer_id: InsurerId,
        policy_number: impl Into<String>,
        claim_amount: Money,
        coverage_percentage: Rate,
        invoice_total: Money,
    ) -> Result<Self, ClaimError> {
        if !claim_amount.is_positive() {
            return Err(ClaimError::NonPositiveClaim {
                amount: claim_amount.amount(),
            });
        }
        if claim_amount.checked_sub(&invoice_total)?.is_positive() {
            return Err(ClaimError::ClaimExceedsInvoice {
                claim: claim_amount.amount(),
                invoice_total: invoice_total.amount(),
            });
        }
        if !coverage_percentage.is_valid_percentage() {
            return Err(ClaimError::CoverageOutOfRange {
                percentage: coverage_percentage.as_percentage(),
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: ClaimId::new_v7(),
            claim_number: claim_number.into(),
            invoice_id,
            patient_id,
            insurer_id,
            policy_number: policy_number.into(),
            claim_amount,
            coverage_percentage,
            approved_amount: None,
            status: ClaimStatus::Submitted,
            submission_date: now,
            tpa_submission_date: None,
            tpa_approval_date: None,
            tpa_rejection_date: None,
            info_requested_at: None,
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Attaches a supporting document
    ///
    /// # Errors
    ///
    /// Returns `ClaimFinal` once the claim has been approved or rejected.
    pub fn attach_document(
        &mut self,
        document_ref: DocumentId,
        label: impl Into<String>,
    ) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::ClaimFinal {
                status: self.status.to_string(),
            });
        }
        let now = Utc::now();
        self.documents.push(ClaimDocument {
            document_ref,
            label: label.into(),
            attached_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// True if any document was attached strictly after `instant`
    pub fn has_documents_since(&self, instant: DateTime<Utc>) -> bool {
        self.documents.iter().any(|d| d.attached_at > instant)
    }

    /// The coverage the policy suggests, before adjudication
    pub fn expected_coverage(&self) -> Money {
        self.coverage_percentage
            .apply(&self.claim_amount)
            .round_to_currency()
    }

    /// What the patient still owes once the claim is approved:
    /// invoice total minus the approved amount
    ///
    /// # Errors
    ///
    /// Returns `NotApproved` while no approved amount has been recorded.
    pub fn patient_responsibility(&self, invoice_total: Money) -> Result<Money, ClaimError> {
        let approved = self.approved_amount.ok_or_else(|| ClaimError::NotApproved {
            status: self.status.to_string(),
        })?;
        Ok(invoice_total.checked_sub(&approved)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn inr(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    fn submit_claim(claim: rust_decimal::Decimal, total: rust_decimal::Decimal) -> Result<InsuranceClaim, ClaimError> {
        InsuranceClaim::submit(
            "CLM-000001",
            InvoiceId::new(),
            PatientId::new(),
            InsurerId::new(),
            "POL-88-1234",
            inr(claim),
            Rate::from_percentage(dec!(80)),
            inr(total),
        )
    }

    #[test]
    fn test_submit_within_invoice_total() {
        let claim = submit_claim(dec!(5000), dec!(5900)).unwrap();
        assert_eq!(claim.status, ClaimStatus::Submitted);
        assert!(claim.approved_amount.is_none());
        assert!(claim.documents.is_empty());
    }

    #[test]
    fn test_submit_rejects_overclaim() {
        let result = submit_claim(dec!(6000), dec!(5900));
        assert!(matches!(result, Err(ClaimError::ClaimExceedsInvoice { .. })));
    }

    #[test]
    fn test_submit_rejects_zero_claim() {
        let result = submit_claim(dec!(0), dec!(5900));
        assert!(matches!(result, Err(ClaimError::NonPositiveClaim { .. })));
    }

    #[test]
    fn test_submit_rejects_coverage_above_100() {
        let result = InsuranceClaim::submit(
            "CLM-000002",
            InvoiceId::new(),
            PatientId::new(),
            InsurerId::new(),
            "POL-88-1234",
            inr(dec!(1000)),
            Rate::from_percentage(dec!(120)),
            inr(dec!(5900)),
        );
        assert!(matches!(result, Err(ClaimError::CoverageOutOfRange { .. })));
    }

    #[test]
    fn test_expected_coverage() {
        let claim = submit_claim(dec!(5000), dec!(5900)).unwrap();
        assert_eq!(claim.expected_coverage().amount(), dec!(4000));
    }

    #[test]
    fn test_patient_responsibility_requires_approval() {
        let claim = submit_claim(dec!(5000), dec!(5900)).unwrap();
        assert!(matches!(
            claim.patient_responsibility(inr(dec!(5900))),
            Err(ClaimError::NotApproved { .. })
        ));
    }
}
