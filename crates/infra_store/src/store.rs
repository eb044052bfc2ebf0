//! The in-memory document store
//!
//! Every mutating operation on an invoice follows the same shape: read the
//! current [`Versioned`] document, validate and rebuild it, then commit the
//! new version together with any appended log entries in one critical
//! section. The commit only succeeds if the presented version is still
//! current; otherwise the writer gets a [`StoreError::VersionConflict`] and
//! must re-read and retry. Operations against different invoices share no
//! version and proceed independently.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use core_kernel::{ClaimId, CreditNoteId, InvoiceId};
use domain_billing::{CreditNote, Invoice, Payment};
use domain_claims::InsuranceClaim;

use crate::error::StoreError;

/// A document paired with its optimistic-concurrency version
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub document: T,
    pub version: u64,
}

#[derive(Default)]
struct Shelves {
    invoices: HashMap<InvoiceId, Versioned<Invoice>>,
    invoice_numbers: HashSet<String>,
    payments: HashMap<InvoiceId, Vec<Payment>>,
    credit_notes: HashMap<InvoiceId, Vec<CreditNote>>,
    credit_note_numbers: HashSet<String>,
    note_index: HashMap<CreditNoteId, InvoiceId>,
    claims: HashMap<ClaimId, Versioned<InsuranceClaim>>,
    claim_numbers: HashSet<String>,
    claims_by_invoice: HashMap<InvoiceId, Vec<ClaimId>>,
}

/// The single source of truth for invoices, their settlement logs, and claims
#[derive(Default)]
pub struct LedgerStore {
    shelves: RwLock<Shelves>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    /// Stores a new invoice at version 1
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDocumentNumber` if the invoice number is taken.
    pub fn insert_invoice(&self, invoice: Invoice) -> Result<Versioned<Invoice>, StoreError> {
        let mut shelves = self.shelves.write();
        if !shelves.invoice_numbers.insert(invoice.invoice_number.clone()) {
            return Err(StoreError::DuplicateDocumentNumber(
                invoice.invoice_number.clone(),
            ));
        }

        let id = invoice.id;
        let versioned = Versioned {
            document: invoice,
            version: 1,
        };
        shelves.invoices.insert(id, versioned.clone());
        shelves.payments.entry(id).or_default();
        shelves.credit_notes.entry(id).or_default();
        shelves.claims_by_invoice.entry(id).or_default();

        debug!(invoice = %versioned.document.invoice_number, "invoice stored");
        Ok(versioned)
    }

    /// Reads an invoice with its current version
    pub fn invoice(&self, id: &InvoiceId) -> Result<Versioned<Invoice>, StoreError> {
        let shelves = self.shelves.read();
        shelves
            .invoices
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::InvoiceNotFound(id.to_string()))
    }

    /// Commits a new invoice version if `expected_version` is still current
    pub fn commit_invoice(
        &self,
        expected_version: u64,
        invoice: Invoice,
    ) -> Result<Versioned<Invoice>, StoreError> {
        let mut shelves = self.shelves.write();
        Self::swap_invoice(&mut shelves, expected_version, invoice)
    }

    /// Commits an invoice version and appends a payment to its log, atomically
    pub fn commit_payment(
        &self,
        expected_version: u64,
        invoice: Invoice,
        payment: Payment,
    ) -> Result<Versioned<Invoice>, StoreError> {
        if payment.invoice_id != invoice.id {
            return Err(StoreError::ForeignDocument {
                document: payment.id.to_string(),
                invoice: invoice.invoice_number.clone(),
            });
        }

        let mut shelves = self.shelves.write();
        let committed = Self::swap_invoice(&mut shelves, expected_version, invoice)?;
        let invoice_id = committed.document.id;
        debug!(
            invoice = %committed.document.invoice_number,
            payment = %payment.id,
            amount = %payment.amount,
            "payment appended"
        );
        shelves.payments.entry(invoice_id).or_default().push(payment);
        Ok(committed)
    }

    /// The append-only payment log of an invoice
    pub fn payments(&self, invoice_id: &InvoiceId) -> Result<Vec<Payment>, StoreError> {
        let shelves = self.shelves.read();
        if !shelves.invoices.contains_key(invoice_id) {
            return Err(StoreError::InvoiceNotFound(invoice_id.to_string()));
        }
        Ok(shelves.payments.get(invoice_id).cloned().unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Credit notes
    // ------------------------------------------------------------------

    /// Appends a newly issued credit note, bumping the invoice version
    ///
    /// Issuing a note validates against the invoice's balance, so the note
    /// commits through the same per-invoice version gate as payments even
    /// though the invoice document itself is unchanged.
    pub fn commit_credit_note(
        &self,
        expected_version: u64,
        invoice: Invoice,
        note: CreditNote,
    ) -> Result<Versioned<Invoice>, StoreError> {
        if note.invoice_id != invoice.id {
            return Err(StoreError::ForeignDocument {
                document: note.credit_note_number.clone(),
                invoice: invoice.invoice_number.clone(),
            });
        }

        let mut shelves = self.shelves.write();
        if shelves.credit_note_numbers.contains(&note.credit_note_number) {
            return Err(StoreError::DuplicateDocumentNumber(
                note.credit_note_number.clone(),
            ));
        }

        let committed = Self::swap_invoice(&mut shelves, expected_version, invoice)?;
        let invoice_id = committed.document.id;
        shelves
            .credit_note_numbers
            .insert(note.credit_note_number.clone());
        shelves.note_index.insert(note.id, invoice_id);
        debug!(
            invoice = %committed.document.invoice_number,
            note = %note.credit_note_number,
            "credit note issued"
        );
        shelves.credit_notes.entry(invoice_id).or_default().push(note);
        Ok(committed)
    }

    /// Replaces a credit note after an adjust/refund transition, committing
    /// the (possibly rebalanced) invoice in the same critical section
    pub fn commit_note_transition(
        &self,
        expected_version: u64,
        invoice: Invoice,
        note: CreditNote,
    ) -> Result<Versioned<Invoice>, StoreError> {
        if note.invoice_id != invoice.id {
            return Err(StoreError::ForeignDocument {
                document: note.credit_note_number.clone(),
                invoice: invoice.invoice_number.clone(),
            });
        }

        let mut shelves = self.shelves.write();
        let invoice_id = invoice.id;

        // Validate everything before touching either document, so a stale
        // version or a missing note never leaves a partial write
        {
            let slot = shelves
                .invoices
                .get(&invoice_id)
                .ok_or_else(|| StoreError::InvoiceNotFound(invoice_id.to_string()))?;
            if slot.version != expected_version {
                return Err(StoreError::VersionConflict {
                    document: invoice.invoice_number.clone(),
                    expected: expected_version,
                    actual: slot.version,
                });
            }
        }
        {
            let log = shelves
                .credit_notes
                .get_mut(&invoice_id)
                .ok_or_else(|| StoreError::InvoiceNotFound(invoice_id.to_string()))?;
            let slot = log
                .iter_mut()
                .find(|n| n.id == note.id)
                .ok_or_else(|| StoreError::CreditNoteNotFound(note.id.to_string()))?;
            *slot = note.clone();
        }

        let committed = Self::swap_invoice(&mut shelves, expected_version, invoice)?;
        debug!(
            invoice = %committed.document.invoice_number,
            note = %note.credit_note_number,
            status = %note.status,
            "credit note transitioned"
        );
        Ok(committed)
    }

    /// The credit notes issued against an invoice
    pub fn credit_notes(&self, invoice_id: &InvoiceId) -> Result<Vec<CreditNote>, StoreError> {
        let shelves = self.shelves.read();
        if !shelves.invoices.contains_key(invoice_id) {
            return Err(StoreError::InvoiceNotFound(invoice_id.to_string()));
        }
        Ok(shelves
            .credit_notes
            .get(invoice_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Looks up a credit note by id, returning it with its invoice
    pub fn credit_note(
        &self,
        note_id: &CreditNoteId,
    ) -> Result<(InvoiceId, CreditNote), StoreError> {
        let shelves = self.shelves.read();
        let invoice_id = shelves
            .note_index
            .get(note_id)
            .copied()
            .ok_or_else(|| StoreError::CreditNoteNotFound(note_id.to_string()))?;
        let note = shelves
            .credit_notes
            .get(&invoice_id)
            .and_then(|log| log.iter().find(|n| n.id == *note_id))
            .cloned()
            .ok_or_else(|| StoreError::CreditNoteNotFound(note_id.to_string()))?;
        Ok((invoice_id, note))
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// Stores a new claim at version 1
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the referenced invoice is unknown
    /// - `DuplicateDocumentNumber` if the claim number is taken
    pub fn insert_claim(
        &self,
        claim: InsuranceClaim,
    ) -> Result<Versioned<InsuranceClaim>, StoreError> {
        let mut shelves = self.shelves.write();
        if !shelves.invoices.contains_key(&claim.invoice_id) {
            return Err(StoreError::InvoiceNotFound(claim.invoice_id.to_string()));
        }
        if !shelves.claim_numbers.insert(claim.claim_number.clone()) {
            return Err(StoreError::DuplicateDocumentNumber(claim.claim_number.clone()));
        }

        let id = claim.id;
        let invoice_id = claim.invoice_id;
        let versioned = Versioned {
            document: claim,
            version: 1,
        };
        shelves.claims.insert(id, versioned.clone());
        shelves
            .claims_by_invoice
            .entry(invoice_id)
            .or_default()
            .push(id);

        debug!(claim = %versioned.document.claim_number, "claim stored");
        Ok(versioned)
    }

    /// Reads a claim with its current version
    pub fn claim(&self, id: &ClaimId) -> Result<Versioned<InsuranceClaim>, StoreError> {
        let shelves = self.shelves.read();
        shelves
            .claims
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ClaimNotFound(id.to_string()))
    }

    /// Commits a new claim version if `expected_version` is still current
    pub fn commit_claim(
        &self,
        expected_version: u64,
        claim: InsuranceClaim,
    ) -> Result<Versioned<InsuranceClaim>, StoreError> {
        let mut shelves = self.shelves.write();
        let slot = shelves
            .claims
            .get_mut(&claim.id)
            .ok_or_else(|| StoreError::ClaimNotFound(claim.id.to_string()))?;
        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                document: claim.claim_number.clone(),
                expected: expected_version,
                actual: slot.version,
            });
        }
        slot.document = claim;
        slot.version += 1;
        Ok(slot.clone())
    }

    /// The claims submitted against an invoice
    pub fn claims_for_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Vec<InsuranceClaim>, StoreError> {
        let shelves = self.shelves.read();
        let ids = shelves
            .claims_by_invoice
            .get(invoice_id)
            .ok_or_else(|| StoreError::InvoiceNotFound(invoice_id.to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|id| shelves.claims.get(id))
            .map(|v| v.document.clone())
            .collect())
    }

    fn swap_invoice(
        shelves: &mut Shelves,
        expected_version: u64,
        invoice: Invoice,
    ) -> Result<Versioned<Invoice>, StoreError> {
        let slot = shelves
            .invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| StoreError::InvoiceNotFound(invoice.id.to_string()))?;
        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                document: invoice.invoice_number.clone(),
                expected: expected_version,
                actual: slot.version,
            });
        }
        slot.document = invoice;
        slot.version += 1;
        Ok(slot.clone())
    }
}
