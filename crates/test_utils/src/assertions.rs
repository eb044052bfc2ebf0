//! Custom assertion helpers for domain types

use core_kernel::{Money, TaxBreakdown};
use domain_billing::{recompute_balance, CreditNote, Invoice, Payment};
use rust_decimal::Decimal;

/// Asserts a money amount equals the expected decimal
#[track_caller]
pub fn assert_amount(money: Money, expected: Decimal) {
    assert_eq!(
        money.amount(),
        expected,
        "expected {} {expected}, got {money}",
        money.currency()
    );
}

/// Asserts a breakdown satisfies every tax invariant
#[track_caller]
pub fn assert_breakdown_reconciles(breakdown: &TaxBreakdown) {
    if let Err(err) = breakdown.validate() {
        panic!("breakdown violates its invariants: {err}");
    }
}

/// Asserts the invoice's cached amounts match a fresh recomputation over its
/// settlement history (the round-trip law)
#[track_caller]
pub fn assert_cache_consistent(invoice: &Invoice, payments: &[Payment], notes: &[CreditNote]) {
    let projection =
        recompute_balance(invoice, payments, notes).expect("projection must recompute");
    assert_eq!(
        projection.paid, invoice.paid_amount,
        "paid cache diverged from the payment log"
    );
    assert_eq!(
        projection.credited, invoice.credited_amount,
        "credited cache diverged from the credit-note log"
    );
    assert_eq!(
        projection.balance,
        invoice.balance_amount(),
        "balance diverged from the recomputation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestInvoiceBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fresh_invoice_is_cache_consistent() {
        let invoice = TestInvoiceBuilder::new().build();
        assert_cache_consistent(&invoice, &[], &[]);
        assert_breakdown_reconciles(&invoice.totals);
        assert_amount(invoice.total_amount(), dec!(1180));
    }
}
