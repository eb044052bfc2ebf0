//! Credit note engine
//!
//! A credit note reverses all or part of an invoice's billed amount. It is
//! issued first, then resolved one of two ways:
//!
//! - **adjust**: the credited amount reduces the invoice balance directly,
//!   equivalent to a negative payment
//! - **refund**: funds are returned to the patient outside the invoice
//!   balance; the invoice remains billed at its original amount
//!
//! Both resolutions are terminal; a resolved note is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{CreditNoteId, InvoiceId, Money, TaxBreakdown};

use crate::error::BillingError;
use crate::invoice::{AdministrativeStatus, Invoice, InvoiceStatus};
use crate::payment::PaymentMethod;

/// Credit note status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditNoteStatus {
    /// Issued but not yet resolved
    Issued,
    /// Credited amount reduced the invoice balance; terminal
    Adjusted,
    /// Funds returned to the patient out of band; terminal
    Refunded,
}

impl CreditNoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreditNoteStatus::Adjusted | CreditNoteStatus::Refunded)
    }
}

impl fmt::Display for CreditNoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreditNoteStatus::Issued => "ISSUED",
            CreditNoteStatus::Adjusted => "ADJUSTED",
            CreditNoteStatus::Refunded => "REFUNDED",
        };
        write!(f, "{label}")
    }
}

/// A reversing document against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNote {
    /// Unique identifier
    pub id: CreditNoteId,
    /// Credit note number (human-readable, unique)
    pub credit_note_number: String,
    /// Invoice being reversed
    pub invoice_id: InvoiceId,
    /// Reason for the reversal
    pub reason: String,
    /// Amount breakdown being reversed
    pub breakdown: TaxBreakdown,
    /// Status
    pub status: CreditNoteStatus,
    /// How the refund was paid out; set only on refund
    pub refund_method: Option<PaymentMethod>,
    /// External reference of the refund; required for non-cash refunds
    pub refund_transaction_id: Option<String>,
    /// When the note was issued
    pub issued_at: DateTime<Utc>,
    /// When the note was adjusted or refunded
    pub resolved_at: Option<DateTime<Utc>>,
}

/// What remains billable on the invoice: the original total minus every
/// credit note already issued against it, in any state
///
/// Adjusted notes are already netted out of the balance, and refunded notes
/// returned cash without changing the balance; either way the amount they
/// cover can never be credited twice. Payments do not reduce what was
/// billed, so a fully paid invoice can still receive a (refund-bound) note.
pub fn creditable_amount(
    invoice: &Invoice,
    existing: &[CreditNote],
) -> Result<Money, BillingError> {
    let mut already_credited = Money::zero(invoice.currency);
    for note in existing {
        if note.invoice_id != invoice.id {
            return Err(BillingError::DocumentInvoiceMismatch {
                document: note.credit_note_number.clone(),
                invoice_number: invoice.invoice_number.clone(),
            });
        }
        already_credited = already_credited.checked_add(&note.breakdown.total())?;
    }
    Ok(invoice.total_amount() - already_credited)
}

impl CreditNote {
    /// Issues a credit note against an invoice
    ///
    /// # Errors
    ///
    /// - `InvoiceNotIssued` / `CreditNotAllowed` for draft or cancelled invoices
    /// - tax errors if the breakdown violates its invariants
    /// - `NonPositiveAmount` for a zero-value note
    /// - `CreditExceedsBillable` when the note exceeds what remains billable
    pub fn issue(
        invoice: &Invoice,
        existing: &[CreditNote],
        credit_note_number: impl Into<String>,
        reason: impl Into<String>,
        breakdown: TaxBreakdown,
    ) -> Result<Self, BillingError> {
        match invoice.status {
            InvoiceStatus::Administrative(AdministrativeStatus::Draft) => {
                return Err(BillingError::InvoiceNotIssued {
                    status: invoice.status.to_string(),
                });
            }
            InvoiceStatus::Administrative(AdministrativeStatus::Cancelled) => {
                return Err(BillingError::CreditNotAllowed {
                    status: invoice.status.to_string(),
                });
            }
            InvoiceStatus::Derived(_) => {}
        }

        breakdown.validate()?;
        if !breakdown.total().is_positive() {
            return Err(BillingError::NonPositiveAmount {
                amount: breakdown.total().amount(),
            });
        }

        let available = creditable_amount(invoice, existing)?;
        if breakdown.total().checked_sub(&available)?.is_positive() {
            return Err(BillingError::CreditExceedsBillable {
                attempted: breakdown.total().amount(),
                available: available.amount(),
            });
        }

        Ok(Self {
            id: CreditNoteId::new_v7(),
            credit_note_number: credit_note_number.into(),
            invoice_id: invoice.id,
            reason: reason.into(),
            breakdown,
            status: CreditNoteStatus::Issued,
            refund_method: None,
            refund_transaction_id: None,
            issued_at: Utc::now(),
            resolved_at: None,
        })
    }

    /// Resolves the note by reducing the invoice balance
    ///
    /// The caller passes the invoice's current balance; the actual balance
    /// mutation happens through the ledger projection once the note is
    /// Adjusted.
    ///
    /// # Errors
    ///
    /// - `CreditNoteFinal` unless the note is still Issued
    /// - `CreditExceedsBalance` when the note total exceeds the balance;
    ///   the excess must go through `refund` instead
    pub fn adjust(&mut self, invoice_balance: Money) -> Result<(), BillingError> {
        self.ensure_open()?;
        if self.breakdown.total().checked_sub(&invoice_balance)?.is_positive() {
            return Err(BillingError::CreditExceedsBalance {
                attempted: self.breakdown.total().amount(),
                balance: invoice_balance.amount(),
            });
        }
        self.status = CreditNoteStatus::Adjusted;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Resolves the note by returning funds to the patient out of band
    ///
    /// The invoice balance is untouched: the refund compensates the patient
    /// without re-opening an otherwise settled invoice.
    ///
    /// # Errors
    ///
    /// - `CreditNoteFinal` unless the note is still Issued
    /// - `MissingTransactionId` for non-cash refunds without a reference
    pub fn refund(
        &mut self,
        method: PaymentMethod,
        transaction_id: Option<String>,
    ) -> Result<(), BillingError> {
        self.ensure_open()?;
        let has_reference = transaction_id
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if method.requires_transaction_id() && !has_reference {
            return Err(BillingError::MissingTransactionId {
                method: method.to_string(),
            });
        }
        self.status = CreditNoteStatus::Refunded;
        self.refund_method = Some(method);
        self.refund_transaction_id = transaction_id;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// True while the note has not been adjusted or refunded
    pub fn is_outstanding(&self) -> bool {
        self.status == CreditNoteStatus::Issued
    }

    fn ensure_open(&self) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::CreditNoteFinal {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, PatientId, Rate};
    use rust_decimal_macros::dec;

    use crate::invoice::LineItem;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn issued_invoice(total_taxable: Decimal) -> Invoice {
        let mut invoice = Invoice::draft(
            "INV-000042",
            PatientId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            Currency::INR,
        );
        let unit_price = Money::new(total_taxable, Currency::INR);
        let breakdown = TaxBreakdown::intra(
            unit_price,
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap();
        invoice
            .add_line(LineItem::new("WARD-GEN", "Ward charges", dec!(1), unit_price, breakdown))
            .unwrap();
        invoice.issue().unwrap();
        invoice
    }

    fn half_note_breakdown() -> TaxBreakdown {
        TaxBreakdown::intra(
            Money::new(dec!(500), Currency::INR),
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_within_billable() {
        let invoice = issued_invoice(dec!(1000));
        let note =
            CreditNote::issue(&invoice, &[], "CRN-000001", "Duplicate charge", half_note_breakdown())
                .unwrap();

        assert_eq!(note.status, CreditNoteStatus::Issued);
        assert_eq!(note.breakdown.total().amount(), dec!(590));
        assert!(note.is_outstanding());
    }

    #[test]
    fn test_issue_rejects_amount_beyond_billable() {
        let invoice = issued_invoice(dec!(400));
        let result = CreditNote::issue(
            &invoice,
            &[],
            "CRN-000002",
            "Overcharge",
            half_note_breakdown(),
        );
        assert!(matches!(
            result,
            Err(BillingError::CreditExceedsBillable { .. })
        ));
    }

    #[test]
    fn test_issue_counts_existing_notes_in_any_state() {
        let invoice = issued_invoice(dec!(1000));
        let mut first =
            CreditNote::issue(&invoice, &[], "CRN-000003", "Partial reversal", half_note_breakdown())
                .unwrap();
        first
            .refund(PaymentMethod::Cash, None)
            .unwrap();

        // 1180 total, 590 already refunded: another 590 fits exactly
        let existing = vec![first];
        let second = CreditNote::issue(
            &invoice,
            &existing,
            "CRN-000004",
            "Second reversal",
            half_note_breakdown(),
        )
        .unwrap();
        assert_eq!(second.breakdown.total().amount(), dec!(590));

        // A third would exceed what was ever billed
        let mut all = existing;
        all.push(second);
        let third = CreditNote::issue(
            &invoice,
            &all,
            "CRN-000005",
            "Third reversal",
            half_note_breakdown(),
        );
        assert!(matches!(
            third,
            Err(BillingError::CreditExceedsBillable { .. })
        ));
    }

    #[test]
    fn test_adjust_rejected_beyond_balance() {
        let invoice = issued_invoice(dec!(1000));
        let mut note =
            CreditNote::issue(&invoice, &[], "CRN-000006", "Reversal", half_note_breakdown())
                .unwrap();

        // Pretend the balance shrank to 100 between issue and adjust
        let result = note.adjust(Money::new(dec!(100), Currency::INR));
        assert!(matches!(
            result,
            Err(BillingError::CreditExceedsBalance { .. })
        ));
        assert_eq!(note.status, CreditNoteStatus::Issued);
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let invoice = issued_invoice(dec!(1000));
        let mut note =
            CreditNote::issue(&invoice, &[], "CRN-000007", "Reversal", half_note_breakdown())
                .unwrap();
        note.adjust(invoice.balance_amount()).unwrap();

        assert!(matches!(
            note.adjust(invoice.balance_amount()),
            Err(BillingError::CreditNoteFinal { .. })
        ));
        assert!(matches!(
            note.refund(PaymentMethod::Cash, None),
            Err(BillingError::CreditNoteFinal { .. })
        ));
    }

    #[test]
    fn test_refund_requires_reference_for_bank_transfer() {
        let invoice = issued_invoice(dec!(1000));
        let mut note =
            CreditNote::issue(&invoice, &[], "CRN-000008", "Reversal", half_note_breakdown())
                .unwrap();

        assert!(matches!(
            note.refund(PaymentMethod::BankTransfer, None),
            Err(BillingError::MissingTransactionId { .. })
        ));

        note.refund(PaymentMethod::BankTransfer, Some("UTR-775533".into()))
            .unwrap();
        assert_eq!(note.status, CreditNoteStatus::Refunded);
        assert_eq!(note.refund_method, Some(PaymentMethod::BankTransfer));
    }

    #[test]
    fn test_issue_rejected_on_cancelled_invoice() {
        let mut invoice = issued_invoice(dec!(1000));
        invoice.cancel().unwrap();
        let result = CreditNote::issue(
            &invoice,
            &[],
            "CRN-000009",
            "Reversal",
            half_note_breakdown(),
        );
        assert!(matches!(result, Err(BillingError::CreditNotAllowed { .. })));
    }
}
