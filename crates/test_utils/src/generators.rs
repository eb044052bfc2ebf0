//! Property-based test data generators

use core_kernel::{Currency, Money, Rate, TaxBreakdown};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Positive INR amounts up to one crore, in paise
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (1i64..1_000_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::INR))
}

/// GST rates between 0% and 40% in basis points
pub fn gst_rate_strategy() -> impl Strategy<Value = Rate> {
    (0u32..4000u32).prop_map(|bp| Rate::from_percentage(Decimal::new(bp as i64, 2)))
}

/// Valid intra-state breakdowns with a proportional discount
pub fn intra_breakdown_strategy() -> impl Strategy<Value = TaxBreakdown> {
    (money_strategy(), gst_rate_strategy(), 0u32..50u32).prop_map(
        |(subtotal, rate, discount_pct)| {
            let discount = subtotal
                .multiply(Decimal::new(discount_pct as i64, 2))
                .round_to_currency();
            TaxBreakdown::intra(subtotal, discount, rate)
                .expect("generated breakdown must be valid")
        },
    )
}

/// Valid inter-state breakdowns
pub fn inter_breakdown_strategy() -> impl Strategy<Value = TaxBreakdown> {
    (money_strategy(), gst_rate_strategy()).prop_map(|(subtotal, rate)| {
        TaxBreakdown::inter(subtotal, Money::zero(Currency::INR), rate)
            .expect("generated breakdown must be valid")
    })
}

/// Sequences of balance fractions (percent of the outstanding balance) used
/// to drive partial-payment runs
pub fn payment_fraction_strategy() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..100u32, 0..8)
}
