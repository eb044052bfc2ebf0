//! Balance projection over the payment and credit-note logs
//!
//! The invoice's `paid_amount`/`credited_amount` fields are a cache; the
//! canonical computation is [`recompute_balance`], a pure function over the
//! invoice and its full settlement history. Recomputing at any time must
//! reproduce the cache exactly; a divergence is a data-integrity error,
//! not a business state.

use chrono::NaiveDate;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::Money;

use crate::credit_note::{CreditNote, CreditNoteStatus};
use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus, SettlementStatus};
use crate::payment::Payment;

/// The recomputed settlement position of one invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProjection {
    /// Invoice total
    pub total: Money,
    /// Sum of all recorded payments
    pub paid: Money,
    /// Sum of credit notes in status Adjusted
    pub credited: Money,
    /// `total - paid - credited`
    pub balance: Money,
}

impl BalanceProjection {
    /// Payments plus adjusted credits
    pub fn settled(&self) -> Money {
        self.paid + self.credited
    }
}

/// Recomputes the balance of `invoice` from its settlement history
///
/// Pure: reads the invoice total, sums the payment log, and sums the
/// credit notes that were resolved by adjustment. Refunded notes do not
/// appear here: they moved cash outside the invoice balance.
///
/// # Errors
///
/// Returns `DocumentInvoiceMismatch` if a payment or note in the slices
/// references a different invoice.
pub fn recompute_balance(
    invoice: &Invoice,
    payments: &[Payment],
    credit_notes: &[CreditNote],
) -> Result<BalanceProjection, BillingError> {
    let currency = invoice.currency;

    let mut paid = Money::zero(currency);
    for payment in payments {
        if payment.invoice_id != invoice.id {
            return Err(BillingError::DocumentInvoiceMismatch {
                document: payment.id.to_string(),
                invoice_number: invoice.invoice_number.clone(),
            });
        }
        paid = paid.checked_add(&payment.amount)?;
    }

    let mut credited = Money::zero(currency);
    for note in credit_notes {
        if note.invoice_id != invoice.id {
            return Err(BillingError::DocumentInvoiceMismatch {
                document: note.credit_note_number.clone(),
                invoice_number: invoice.invoice_number.clone(),
            });
        }
        if note.status == CreditNoteStatus::Adjusted {
            credited = credited.checked_add(&note.breakdown.total())?;
        }
    }

    let total = invoice.total_amount();
    let balance = total.checked_sub(&paid)?.checked_sub(&credited)?;

    Ok(BalanceProjection {
        total,
        paid,
        credited,
        balance,
    })
}

/// Derives the settlement status from a projection
///
/// Only the derived branch of the invoice status is ever produced here;
/// Draft and Cancelled are administrative and never derived.
pub fn derive_status(
    projection: &BalanceProjection,
    due_date: NaiveDate,
    as_of: NaiveDate,
) -> SettlementStatus {
    if !projection.balance.is_positive() {
        SettlementStatus::Paid
    } else if projection.settled().is_positive() {
        SettlementStatus::PartiallyPaid
    } else if as_of > due_date {
        SettlementStatus::Overdue
    } else {
        SettlementStatus::Pending
    }
}

/// Writes a projection back into the invoice's cache fields and re-derives
/// the settlement status
///
/// # Errors
///
/// Returns `SettlementNotApplicable` for draft or cancelled invoices: their
/// status is administrative and the projection must not overwrite it.
pub fn apply_projection(
    invoice: &mut Invoice,
    projection: &BalanceProjection,
    as_of: NaiveDate,
) -> Result<(), BillingError> {
    match invoice.status {
        InvoiceStatus::Administrative(_) => Err(BillingError::SettlementNotApplicable {
            status: invoice.status.to_string(),
        }),
        InvoiceStatus::Derived(_) => {
            invoice.paid_amount = projection.paid;
            invoice.credited_amount = projection.credited;
            let status = InvoiceStatus::Derived(derive_status(projection, invoice.due_date, as_of));
            debug!(
                invoice = %invoice.invoice_number,
                balance = %projection.balance,
                status = %status,
                "applied balance projection"
            );
            invoice.status = status;
            invoice.updated_at = Utc::now();
            Ok(())
        }
    }
}

/// Recomputes and checks the invoice's cached amounts against the projection
///
/// # Errors
///
/// Returns `BalanceCacheDiverged` when the cache and the recomputation
/// disagree, a data-integrity defect that must surface rather than be healed
/// silently.
pub fn verify_cached_balance(
    invoice: &Invoice,
    payments: &[Payment],
    credit_notes: &[CreditNote],
) -> Result<BalanceProjection, BillingError> {
    let projection = recompute_balance(invoice, payments, credit_notes)?;
    if projection.paid != invoice.paid_amount || projection.credited != invoice.credited_amount {
        return Err(BillingError::BalanceCacheDiverged {
            cached: invoice.balance_amount().amount(),
            recomputed: projection.balance.amount(),
        });
    }
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{Currency, PatientId, Rate, TaxBreakdown};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::invoice::LineItem;
    use crate::payment::PaymentMethod;

    fn issued_invoice(taxable: Decimal) -> Invoice {
        let mut invoice = Invoice::draft(
            "INV-000100",
            PatientId::new(),
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
            Currency::INR,
        );
        let unit_price = Money::new(taxable, Currency::INR);
        let breakdown = TaxBreakdown::intra(
            unit_price,
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap();
        invoice
            .add_line(LineItem::new("CONS-GEN", "Consultation", dec!(1), unit_price, breakdown))
            .unwrap();
        invoice.issue().unwrap();
        invoice
    }

    fn cash(invoice: &Invoice, amount: Decimal) -> Payment {
        Payment::record(
            invoice.id,
            Money::new(amount, Currency::INR),
            PaymentMethod::Cash,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_projection_with_no_history() {
        let invoice = issued_invoice(dec!(1000));
        let p = recompute_balance(&invoice, &[], &[]).unwrap();

        assert_eq!(p.total.amount(), dec!(1180));
        assert!(p.paid.is_zero());
        assert!(p.credited.is_zero());
        assert_eq!(p.balance.amount(), dec!(1180));
    }

    #[test]
    fn test_projection_sums_payments() {
        let invoice = issued_invoice(dec!(1000));
        let payments = vec![cash(&invoice, dec!(500)), cash(&invoice, dec!(180))];

        let p = recompute_balance(&invoice, &payments, &[]).unwrap();
        assert_eq!(p.paid.amount(), dec!(680));
        assert_eq!(p.balance.amount(), dec!(500));
    }

    #[test]
    fn test_projection_ignores_unadjusted_notes() {
        use crate::credit_note::CreditNote;

        let invoice = issued_invoice(dec!(1000));
        let breakdown = TaxBreakdown::intra(
            Money::new(dec!(500), Currency::INR),
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap();
        let mut adjusted =
            CreditNote::issue(&invoice, &[], "CRN-000100", "Reversal", breakdown).unwrap();
        let issued_only = CreditNote::issue(
            &invoice,
            &[adjusted.clone()],
            "CRN-000101",
            "Pending reversal",
            breakdown,
        )
        .unwrap();
        adjusted.adjust(invoice.balance_amount()).unwrap();

        let p = recompute_balance(&invoice, &[], &[adjusted, issued_only]).unwrap();
        assert_eq!(p.credited.amount(), dec!(590));
        assert_eq!(p.balance.amount(), dec!(590));
    }

    #[test]
    fn test_projection_rejects_foreign_payment() {
        let invoice = issued_invoice(dec!(1000));
        let other = issued_invoice(dec!(2000));
        let stray = cash(&other, dec!(100));

        let result = recompute_balance(&invoice, &[stray], &[]);
        assert!(matches!(
            result,
            Err(BillingError::DocumentInvoiceMismatch { .. })
        ));
    }

    #[test]
    fn test_derive_status_table() {
        let due = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
        let before_due = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();
        let after_due = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let inr = |d| Money::new(d, Currency::INR);

        let fresh = BalanceProjection {
            total: inr(dec!(1180)),
            paid: inr(dec!(0)),
            credited: inr(dec!(0)),
            balance: inr(dec!(1180)),
        };
        assert_eq!(derive_status(&fresh, due, before_due), SettlementStatus::Pending);
        assert_eq!(derive_status(&fresh, due, after_due), SettlementStatus::Overdue);

        let partial = BalanceProjection {
            total: inr(dec!(1180)),
            paid: inr(dec!(500)),
            credited: inr(dec!(0)),
            balance: inr(dec!(680)),
        };
        // Once anything has settled, lateness no longer reclassifies it
        assert_eq!(
            derive_status(&partial, due, after_due),
            SettlementStatus::PartiallyPaid
        );

        let settled = BalanceProjection {
            total: inr(dec!(1180)),
            paid: inr(dec!(1180)),
            credited: inr(dec!(0)),
            balance: inr(dec!(0)),
        };
        assert_eq!(derive_status(&settled, due, after_due), SettlementStatus::Paid);
    }

    #[test]
    fn test_apply_projection_updates_caches() {
        let mut invoice = issued_invoice(dec!(1000));
        let payments = vec![cash(&invoice, dec!(1180))];
        let p = recompute_balance(&invoice, &payments, &[]).unwrap();

        let issue_date = invoice.issue_date;
        apply_projection(&mut invoice, &p, issue_date).unwrap();
        assert!(invoice.status.is_paid());
        assert!(invoice.balance_amount().is_zero());
        assert!(verify_cached_balance(&invoice, &payments, &[]).is_ok());
    }

    #[test]
    fn test_apply_projection_refuses_administrative_statuses() {
        let mut invoice = issued_invoice(dec!(1000));
        let p = recompute_balance(&invoice, &[], &[]).unwrap();
        invoice.cancel().unwrap();

        let issue_date = invoice.issue_date;
        assert!(matches!(
            apply_projection(&mut invoice, &p, issue_date),
            Err(BillingError::SettlementNotApplicable { .. })
        ));
        assert!(invoice.status.is_cancelled());
    }

    #[test]
    fn test_verify_detects_divergent_cache() {
        let mut invoice = issued_invoice(dec!(1000));
        let payments = vec![cash(&invoice, dec!(500))];
        let p = recompute_balance(&invoice, &payments, &[]).unwrap();
        let issue_date = invoice.issue_date;
        apply_projection(&mut invoice, &p, issue_date).unwrap();

        // Corrupt the cache directly
        invoice.paid_amount = Money::new(dec!(9), Currency::INR);
        assert!(matches!(
            verify_cached_balance(&invoice, &payments, &[]),
            Err(BillingError::BalanceCacheDiverged { .. })
        ));
    }
}
