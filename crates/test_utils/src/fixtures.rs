//! Test Fixtures
//!
//! Pre-built test data with sensible values for the common cases.

use chrono::NaiveDate;
use core_kernel::{Currency, InsurerId, Money, PatientId, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Money amounts used across the suite
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// INR helper
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    /// The canonical consultation total: ₹1,000 + 18% GST
    pub fn consultation_total() -> Money {
        Self::inr(dec!(1180))
    }

    /// Half of the canonical invoice, the usual credit note size
    pub fn half_consultation() -> Money {
        Self::inr(dec!(590))
    }

    /// The standard GST rate
    pub fn standard_gst() -> Rate {
        Rate::from_percentage(dec!(18))
    }

    /// The reduced GST rate applied to ward charges
    pub fn reduced_gst() -> Rate {
        Rate::from_percentage(dec!(12))
    }
}

/// Dates used across the suite
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A fixed issue date
    pub fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date")
    }

    /// Thirty days after the issue date
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 31).expect("valid date")
    }

    /// A date safely past the due date
    pub fn after_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date")
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn patient_id() -> PatientId {
        PatientId::new_v7()
    }

    pub fn insurer_id() -> InsurerId {
        InsurerId::new_v7()
    }
}

/// String fixtures
pub struct StringFixtures;

impl StringFixtures {
    pub fn policy_number() -> &'static str {
        "POL-2026-1234"
    }

    pub fn bank_reference() -> &'static str {
        "UTR-77553311"
    }

    pub fn service_code() -> &'static str {
        "CONS-GEN"
    }
}
