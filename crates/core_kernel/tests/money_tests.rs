//! Tests for Money and Rate

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_money_zero() {
    let zero = Money::zero(Currency::INR);
    assert!(zero.is_zero());
    assert!(!zero.is_positive());
    assert!(!zero.is_negative());
}

#[test]
fn test_money_display_uses_currency_symbol() {
    let m = Money::new(dec!(1180), Currency::INR);
    assert_eq!(m.to_string(), "₹ 1180.00");
}

#[test]
fn test_checked_sub_can_go_negative() {
    let a = Money::new(dec!(100), Currency::INR);
    let b = Money::new(dec!(150), Currency::INR);

    let diff = a.checked_sub(&b).unwrap();
    assert!(diff.is_negative());
    assert_eq!(diff.amount(), dec!(-50));
}

#[test]
fn test_divide_by_zero_rejected() {
    let m = Money::new(dec!(100), Currency::INR);
    assert_eq!(m.divide(Decimal::ZERO), Err(MoneyError::DivisionByZero));
}

#[test]
fn test_multiply_by_quantity() {
    let unit_price = Money::new(dec!(250.50), Currency::INR);
    let gross = unit_price.multiply(dec!(4));
    assert_eq!(gross.amount(), dec!(1002.00));
}

#[test]
fn test_round_to_currency() {
    let m = Money::new(dec!(99.999), Currency::INR);
    assert_eq!(m.round_to_currency().amount(), dec!(100.00));
}

#[test]
fn test_rate_round_trip() {
    let rate = Rate::from_percentage(dec!(12));
    assert_eq!(rate.as_decimal(), dec!(0.12));
    assert_eq!(rate.as_percentage(), dec!(12));
}

#[test]
fn test_coverage_rate_application() {
    // 80% coverage of a ₹5,000 claim
    let coverage = Rate::from_percentage(dec!(80));
    let claim = Money::new(dec!(5000), Currency::INR);
    assert_eq!(coverage.apply(&claim).amount(), dec!(4000));
}

#[test]
fn test_serde_round_trip() {
    let m = Money::new(dec!(1180.00), Currency::INR);
    let json = serde_json::to_string(&m).unwrap();
    let back: Money = serde_json::from_str(&json).unwrap();
    assert_eq!(m, back);
}
