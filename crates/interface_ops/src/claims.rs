//! Claims operations
//!
//! Claims are decoupled from cash movement: approval records the payer's
//! committed amount and nothing else. Reconciling a remittance into the
//! invoice happens through the ordinary payment application with method
//! `Insurance`.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{ClaimId, DocumentId, InsurerId, InvoiceId, Money, Rate};
use domain_claims::{apply_action, ClaimAction, InsuranceClaim};
use infra_store::{DocumentNumbers, LedgerStore, Versioned};

use crate::error::OpsError;
use crate::ports::{Collaborators, Notification};

/// Request to submit a claim against an invoice
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClaimSubmission {
    pub invoice_id: InvoiceId,
    pub insurer_id: InsurerId,
    #[validate(length(min = 1))]
    pub policy_number: String,
    pub claim_amount: Money,
    /// Coverage percentage under the policy, 0-100
    pub coverage_percentage: Decimal,
}

/// The claims operations exposed to calling surfaces
pub struct ClaimsOps {
    store: Arc<LedgerStore>,
    numbers: Arc<DocumentNumbers>,
    collaborators: Collaborators,
}

impl ClaimsOps {
    pub fn new(
        store: Arc<LedgerStore>,
        numbers: Arc<DocumentNumbers>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            store,
            numbers,
            collaborators,
        }
    }

    /// Submits a new claim
    ///
    /// The claim amount is checked against the invoice total once, here;
    /// line items freeze at issue so the bound cannot drift afterwards.
    #[instrument(skip(self, submission), fields(invoice = %submission.invoice_id))]
    pub async fn submit_claim(
        &self,
        submission: ClaimSubmission,
    ) -> Result<InsuranceClaim, OpsError> {
        submission.validate()?;

        let invoice = self.store.invoice(&submission.invoice_id)?.document;
        if invoice.status.is_draft() || invoice.status.is_cancelled() {
            return Err(OpsError::InvalidState(format!(
                "claims cannot be submitted against a {} invoice",
                invoice.status
            )));
        }

        let claim = InsuranceClaim::submit(
            self.numbers.claims.next(),
            invoice.id,
            invoice.patient_id,
            submission.insurer_id,
            submission.policy_number,
            submission.claim_amount,
            Rate::from_percentage(submission.coverage_percentage),
            invoice.total_amount(),
        )?;

        let stored = self.store.insert_claim(claim)?;
        info!(
            claim = %stored.document.claim_number,
            amount = %stored.document.claim_amount,
            "claim submitted"
        );
        self.correspond(&stored.document).await;
        Ok(stored.document)
    }

    /// Attaches a supporting document after verifying the opaque reference
    /// against the document store
    #[instrument(skip(self, label), fields(claim = %claim_id))]
    pub async fn attach_document(
        &self,
        claim_id: ClaimId,
        document_ref: DocumentId,
        label: String,
    ) -> Result<InsuranceClaim, OpsError> {
        match self.collaborators.documents.exists(document_ref).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(OpsError::Validation(format!(
                    "document {document_ref} not found in the document store"
                )));
            }
            Err(err) => {
                return Err(OpsError::Validation(format!("document store: {err}")));
            }
        }

        let Versioned {
            document: mut claim,
            version,
        } = self.store.claim(&claim_id)?;
        claim.attach_document(document_ref, label)?;
        let committed = self.store.commit_claim(version, claim)?;
        Ok(committed.document)
    }

    /// Applies a workflow action to a claim
    #[instrument(skip(self), fields(claim = %claim_id, action = action.name()))]
    pub async fn transition_claim(
        &self,
        claim_id: ClaimId,
        action: ClaimAction,
    ) -> Result<InsuranceClaim, OpsError> {
        let Versioned {
            document: mut claim,
            version,
        } = self.store.claim(&claim_id)?;

        apply_action(&mut claim, action, Utc::now())?;
        let committed = self.store.commit_claim(version, claim)?;
        self.correspond(&committed.document).await;
        Ok(committed.document)
    }

    /// Reads a claim with its current version
    pub fn get_claim(&self, claim_id: &ClaimId) -> Result<Versioned<InsuranceClaim>, OpsError> {
        Ok(self.store.claim(claim_id)?)
    }

    /// The claims submitted against an invoice
    pub fn list_claims(&self, invoice_id: &InvoiceId) -> Result<Vec<InsuranceClaim>, OpsError> {
        Ok(self.store.claims_for_invoice(invoice_id)?)
    }

    /// What the patient still owes on an approved claim:
    /// invoice total minus the approved amount
    pub fn patient_responsibility(&self, claim_id: &ClaimId) -> Result<Money, OpsError> {
        let claim = self.store.claim(claim_id)?.document;
        let invoice = self.store.invoice(&claim.invoice_id)?.document;
        Ok(claim.patient_responsibility(invoice.total_amount())?)
    }

    /// Fire-and-forget claim correspondence
    async fn correspond(&self, claim: &InsuranceClaim) {
        let notification = Notification::ClaimCorrespondence {
            claim_number: claim.claim_number.clone(),
            status: claim.status,
        };
        if let Err(err) = self.collaborators.notifications.notify(notification).await {
            warn!(%err, "claim correspondence failed");
        }
    }
}
