//! Billing operations
//!
//! The write path of every operation is the same read-validate-commit cycle:
//! read the versioned invoice, validate against the domain rules, rebuild
//! the document, and commit through the store's per-invoice version gate.
//! A failed validation or a stale version leaves every document exactly as
//! it was.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{Currency, CreditNoteId, InvoiceId, Money, PatientId, ReceiptId, TaxBreakdown};
use domain_billing::{
    apply_projection, recompute_balance, validate_application, verify_cached_balance,
    BalanceProjection, CreditNote, Invoice, LineItem, Payment, PaymentMethod,
};
use infra_store::{DocumentNumbers, LedgerStore, Versioned};

use crate::config::LedgerConfig;
use crate::error::OpsError;
use crate::ports::{Collaborators, Notification, PortError};

/// One line of an invoice draft; the catalog supplies price and tax class
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DraftLine {
    #[validate(length(min = 1))]
    pub service_code: String,
    pub quantity: Decimal,
    /// Absolute discount on the line, if any
    pub discount: Option<Money>,
}

/// Request to issue an invoice
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoiceDraft {
    pub patient_id: PatientId,
    pub currency: Currency,
    /// Defaults to the configured due offset from today
    pub due_date: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub lines: Vec<DraftLine>,
}

/// Request to apply a payment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    #[validate(length(min = 1))]
    pub transaction_id: Option<String>,
    /// Defaults to now
    pub received_at: Option<DateTime<Utc>>,
}

/// Request to issue a credit note
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreditNoteRequest {
    #[validate(length(min = 1))]
    pub reason: String,
    pub breakdown: TaxBreakdown,
}

/// Request to refund a credit note
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefundRequest {
    pub method: PaymentMethod,
    #[validate(length(min = 1))]
    pub transaction_id: Option<String>,
}

/// The receipt handed back after a successful payment application
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub receipt_id: ReceiptId,
    pub payment: Payment,
    pub invoice: Invoice,
}

/// The billing operations exposed to calling surfaces
pub struct BillingOps {
    store: Arc<LedgerStore>,
    numbers: Arc<DocumentNumbers>,
    collaborators: Collaborators,
    config: LedgerConfig,
}

impl BillingOps {
    pub fn new(
        store: Arc<LedgerStore>,
        numbers: Arc<DocumentNumbers>,
        collaborators: Collaborators,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            numbers,
            collaborators,
            config,
        }
    }

    /// Issues an invoice from a draft: prices every line through the
    /// catalog, validates the breakdown invariants, freezes the lines, and
    /// stores the invoice as PENDING.
    #[instrument(skip(self, draft), fields(patient = %draft.patient_id))]
    pub async fn issue_invoice(&self, draft: InvoiceDraft) -> Result<Invoice, OpsError> {
        draft.validate()?;

        // The patient reference must resolve before anything is billed
        self.collaborators
            .directory
            .resolve(draft.patient_id)
            .await
            .map_err(|err| match err {
                PortError::NotFound { .. } => OpsError::NotFound {
                    entity: "patient",
                    id: draft.patient_id.to_string(),
                },
                other => OpsError::Validation(format!("patient directory: {other}")),
            })?;

        let today = Utc::now().date_naive();
        let due_date = draft
            .due_date
            .unwrap_or_else(|| today + Days::new(self.config.default_due_days));

        let mut invoice = Invoice::draft(
            self.numbers.invoices.next(),
            draft.patient_id,
            today,
            due_date,
            draft.currency,
        );

        for line in &draft.lines {
            line.validate()?;
            let entry = self
                .collaborators
                .catalog
                .lookup(&line.service_code)
                .await
                .map_err(|err| match err {
                    PortError::NotFound { .. } => {
                        OpsError::Validation(format!("unknown service code {}", line.service_code))
                    }
                    other => OpsError::Validation(format!("service catalog: {other}")),
                })?;

            let discount = line.discount.unwrap_or_else(|| Money::zero(draft.currency));
            let subtotal = entry.unit_price.multiply(line.quantity).round_to_currency();
            let breakdown = entry.tax_class.breakdown(subtotal, discount)?;
            invoice.add_line(LineItem::new(
                line.service_code.clone(),
                entry.description.clone(),
                line.quantity,
                entry.unit_price,
                breakdown,
            ))?;
        }

        invoice.issue()?;
        let stored = self.store.insert_invoice(invoice)?;
        info!(
            invoice = %stored.document.invoice_number,
            total = %stored.document.total_amount(),
            "invoice issued"
        );
        Ok(stored.document)
    }

    /// Applies a payment: validates, records the immutable payment,
    /// recomputes the balance, and commits both atomically.
    #[instrument(skip(self, request), fields(invoice = %invoice_id))]
    pub async fn apply_payment(
        &self,
        invoice_id: InvoiceId,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, OpsError> {
        request.validate()?;

        let Versioned {
            document: mut invoice,
            version,
        } = self.store.invoice(&invoice_id)?;

        validate_application(&invoice, request.amount)?;
        let payment = Payment::record(
            invoice.id,
            request.amount,
            request.method,
            request.transaction_id.clone(),
            request.received_at.unwrap_or_else(Utc::now),
        )?;

        let mut payments = self.store.payments(&invoice_id)?;
        payments.push(payment.clone());
        let notes = self.store.credit_notes(&invoice_id)?;
        let projection = recompute_balance(&invoice, &payments, &notes)?;
        apply_projection(&mut invoice, &projection, Utc::now().date_naive())?;

        let committed = self.store.commit_payment(version, invoice, payment.clone())?;
        info!(
            invoice = %committed.document.invoice_number,
            amount = %payment.amount,
            balance = %committed.document.balance_amount(),
            "payment applied"
        );

        self.send_receipt(&committed.document, &payment).await;

        Ok(PaymentReceipt {
            receipt_id: ReceiptId::new_v7(),
            payment,
            invoice: committed.document,
        })
    }

    /// Issues a credit note against an invoice
    #[instrument(skip(self, request), fields(invoice = %invoice_id))]
    pub async fn issue_credit_note(
        &self,
        invoice_id: InvoiceId,
        request: CreditNoteRequest,
    ) -> Result<CreditNote, OpsError> {
        request.validate()?;

        let Versioned { document: invoice, version } = self.store.invoice(&invoice_id)?;
        let existing = self.store.credit_notes(&invoice_id)?;
        let note = CreditNote::issue(
            &invoice,
            &existing,
            self.numbers.credit_notes.next(),
            request.reason,
            request.breakdown,
        )?;

        self.store
            .commit_credit_note(version, invoice, note.clone())?;
        info!(note = %note.credit_note_number, "credit note issued");
        Ok(note)
    }

    /// Resolves a credit note by adjusting it into the invoice balance
    #[instrument(skip(self), fields(note = %note_id))]
    pub async fn adjust_credit_note(
        &self,
        note_id: CreditNoteId,
    ) -> Result<(CreditNote, Invoice), OpsError> {
        let (invoice_id, mut note) = self.store.credit_note(&note_id)?;
        let Versioned {
            document: mut invoice,
            version,
        } = self.store.invoice(&invoice_id)?;

        note.adjust(invoice.balance_amount())?;

        let payments = self.store.payments(&invoice_id)?;
        let mut notes = self.store.credit_notes(&invoice_id)?;
        for stored_note in notes.iter_mut() {
            if stored_note.id == note.id {
                *stored_note = note.clone();
            }
        }
        let projection = recompute_balance(&invoice, &payments, &notes)?;
        apply_projection(&mut invoice, &projection, Utc::now().date_naive())?;

        let committed = self
            .store
            .commit_note_transition(version, invoice, note.clone())?;
        info!(
            note = %note.credit_note_number,
            balance = %committed.document.balance_amount(),
            "credit note adjusted"
        );
        Ok((note, committed.document))
    }

    /// Resolves a credit note by refunding the patient out of band;
    /// the invoice balance is untouched
    #[instrument(skip(self, request), fields(note = %note_id))]
    pub async fn refund_credit_note(
        &self,
        note_id: CreditNoteId,
        request: RefundRequest,
    ) -> Result<CreditNote, OpsError> {
        request.validate()?;

        let (invoice_id, mut note) = self.store.credit_note(&note_id)?;
        let Versioned { document: invoice, version } = self.store.invoice(&invoice_id)?;

        note.refund(request.method, request.transaction_id)?;
        self.store
            .commit_note_transition(version, invoice, note.clone())?;
        info!(note = %note.credit_note_number, "credit note refunded");
        Ok(note)
    }

    /// Cancels an invoice (explicit administrative action)
    #[instrument(skip(self), fields(invoice = %invoice_id))]
    pub async fn cancel_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, OpsError> {
        let Versioned {
            document: mut invoice,
            version,
        } = self.store.invoice(&invoice_id)?;
        invoice.cancel()?;
        let committed = self.store.commit_invoice(version, invoice)?;
        info!(invoice = %committed.document.invoice_number, "invoice cancelled");
        Ok(committed.document)
    }

    /// Reads an invoice with its current version
    pub fn get_invoice(&self, invoice_id: &InvoiceId) -> Result<Versioned<Invoice>, OpsError> {
        Ok(self.store.invoice(invoice_id)?)
    }

    /// Recomputes the balance from the settlement history and verifies the
    /// cached amounts against it
    pub fn get_balance(&self, invoice_id: &InvoiceId) -> Result<BalanceProjection, OpsError> {
        let invoice = self.store.invoice(invoice_id)?.document;
        let payments = self.store.payments(invoice_id)?;
        let notes = self.store.credit_notes(invoice_id)?;
        Ok(verify_cached_balance(&invoice, &payments, &notes)?)
    }

    /// The append-only payment log of an invoice
    pub fn list_payments(&self, invoice_id: &InvoiceId) -> Result<Vec<Payment>, OpsError> {
        Ok(self.store.payments(invoice_id)?)
    }

    /// The credit notes issued against an invoice
    pub fn list_credit_notes(&self, invoice_id: &InvoiceId) -> Result<Vec<CreditNote>, OpsError> {
        Ok(self.store.credit_notes(invoice_id)?)
    }

    /// Fire-and-forget receipt delivery; failures are logged, never surfaced
    async fn send_receipt(&self, invoice: &Invoice, payment: &Payment) {
        let patient_name = match self.collaborators.directory.resolve(invoice.patient_id).await {
            Ok(summary) => summary.display_name,
            Err(err) => {
                warn!(%err, "patient directory lookup failed; receipt uses the raw reference");
                invoice.patient_id.to_string()
            }
        };
        let notification = Notification::ReceiptIssued {
            invoice_number: invoice.invoice_number.clone(),
            patient_name,
            amount: payment.amount,
        };
        if let Err(err) = self.collaborators.notifications.notify(notification).await {
            warn!(%err, "receipt notification failed");
        }
    }
}
