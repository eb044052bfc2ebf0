//! GST tax breakdowns
//!
//! Every billable document (invoice line, invoice aggregate, credit note)
//! carries the same monetary shape: a subtotal, an optional discount, the
//! taxable amount, the GST components, and the resulting total. GST splits
//! one of three ways:
//!
//! - intra-state: CGST + SGST, each half of the applicable rate
//! - inter-state: IGST at the full rate
//! - exempt: no tax at all
//!
//! IGST never combines with CGST/SGST on the same document. Rates are
//! supplied by the service catalog; this module only enforces the
//! arithmetic invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{Currency, Money, MoneyError, Rate};

/// Errors raised when a tax breakdown violates its invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Negative {component} in tax breakdown")]
    NegativeComponent { component: &'static str },

    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { subtotal: Decimal, discount: Decimal },

    #[error("Taxable amount {actual} does not equal subtotal minus discount ({expected})")]
    TaxableMismatch { expected: Decimal, actual: Decimal },

    #[error("Total {actual} does not equal taxable amount plus tax components ({expected})")]
    TotalMismatch { expected: Decimal, actual: Decimal },

    #[error("IGST cannot be combined with CGST/SGST on the same document")]
    MixedJurisdiction,

    #[error("CGST and SGST must both be present or both be absent")]
    LopsidedSplit,
}

/// Classification of a breakdown's tax split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxSplit {
    /// CGST + SGST (intra-state supply)
    IntraState,
    /// IGST only (inter-state supply)
    InterState,
    /// No tax levied
    Exempt,
}

/// The monetary shape shared by invoices, line items, and credit notes
///
/// Constructed values always satisfy:
///
/// - `taxable_amount == subtotal - discount`
/// - `total == taxable_amount + cgst + sgst + igst`
/// - IGST is mutually exclusive with CGST/SGST
///
/// `validate` re-checks the invariants, which matters for breakdowns that
/// arrive through deserialization rather than a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    subtotal: Money,
    discount: Money,
    taxable_amount: Money,
    cgst: Money,
    sgst: Money,
    igst: Money,
    total: Money,
}

impl TaxBreakdown {
    /// Builds an exempt breakdown: no tax, total equals the taxable amount
    pub fn exempt(subtotal: Money, discount: Money) -> Result<Self, TaxError> {
        let currency = subtotal.currency();
        let zero = Money::zero(currency);
        Self::assemble(subtotal, discount, zero, zero, zero)
    }

    /// Builds an intra-state breakdown: the GST rate splits evenly into CGST and SGST
    pub fn intra(subtotal: Money, discount: Money, gst_rate: Rate) -> Result<Self, TaxError> {
        let currency = subtotal.currency();
        let dp = currency.decimal_places();
        let taxable = subtotal.checked_sub(&discount)?;
        let half = gst_rate.halved().apply(&taxable).round_bankers(dp);
        Self::assemble(subtotal, discount, half, half, Money::zero(currency))
    }

    /// Builds an inter-state breakdown: IGST at the full GST rate
    pub fn inter(subtotal: Money, discount: Money, gst_rate: Rate) -> Result<Self, TaxError> {
        let currency = subtotal.currency();
        let dp = currency.decimal_places();
        let taxable = subtotal.checked_sub(&discount)?;
        let igst = gst_rate.apply(&taxable).round_bankers(dp);
        let zero = Money::zero(currency);
        Self::assemble(subtotal, discount, zero, zero, igst)
    }

    /// Builds a breakdown from explicit tax components, validating the split
    pub fn from_components(
        subtotal: Money,
        discount: Money,
        cgst: Money,
        sgst: Money,
        igst: Money,
    ) -> Result<Self, TaxError> {
        Self::assemble(subtotal, discount, cgst, sgst, igst)
    }

    /// An all-zero breakdown in the given currency
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            subtotal: zero,
            discount: zero,
            taxable_amount: zero,
            cgst: zero,
            sgst: zero,
            igst: zero,
            total: zero,
        }
    }

    fn assemble(
        subtotal: Money,
        discount: Money,
        cgst: Money,
        sgst: Money,
        igst: Money,
    ) -> Result<Self, TaxError> {
        let taxable_amount = subtotal.checked_sub(&discount)?;
        let total = taxable_amount
            .checked_add(&cgst)?
            .checked_add(&sgst)?
            .checked_add(&igst)?;

        let breakdown = Self {
            subtotal,
            discount,
            taxable_amount,
            cgst,
            sgst,
            igst,
            total,
        };
        breakdown.validate()?;
        Ok(breakdown)
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn taxable_amount(&self) -> Money {
        self.taxable_amount
    }

    pub fn cgst(&self) -> Money {
        self.cgst
    }

    pub fn sgst(&self) -> Money {
        self.sgst
    }

    pub fn igst(&self) -> Money {
        self.igst
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> Currency {
        self.subtotal.currency()
    }

    /// Classifies the tax split
    pub fn split(&self) -> TaxSplit {
        if self.igst.is_positive() {
            TaxSplit::InterState
        } else if self.cgst.is_positive() && self.sgst.is_positive() {
            TaxSplit::IntraState
        } else {
            TaxSplit::Exempt
        }
    }

    /// Checks every breakdown invariant
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: negative components, a discount
    /// larger than the subtotal, a taxable amount or total that does not
    /// reconcile, or a forbidden IGST/CGST/SGST mix.
    pub fn validate(&self) -> Result<(), TaxError> {
        for (component, amount) in [
            ("subtotal", self.subtotal),
            ("discount", self.discount),
            ("taxable amount", self.taxable_amount),
            ("CGST", self.cgst),
            ("SGST", self.sgst),
            ("IGST", self.igst),
            ("total", self.total),
        ] {
            if amount.is_negative() {
                return Err(TaxError::NegativeComponent { component });
            }
        }

        let expected_taxable = self.subtotal.checked_sub(&self.discount)?;
        if expected_taxable.is_negative() {
            return Err(TaxError::DiscountExceedsSubtotal {
                subtotal: self.subtotal.amount(),
                discount: self.discount.amount(),
            });
        }
        if self.taxable_amount != expected_taxable {
            return Err(TaxError::TaxableMismatch {
                expected: expected_taxable.amount(),
                actual: self.taxable_amount.amount(),
            });
        }

        let expected_total = self
            .taxable_amount
            .checked_add(&self.cgst)?
            .checked_add(&self.sgst)?
            .checked_add(&self.igst)?;
        if self.total != expected_total {
            return Err(TaxError::TotalMismatch {
                expected: expected_total.amount(),
                actual: self.total.amount(),
            });
        }

        if self.igst.is_positive() && (self.cgst.is_positive() || self.sgst.is_positive()) {
            return Err(TaxError::MixedJurisdiction);
        }
        if self.cgst.is_positive() != self.sgst.is_positive() {
            return Err(TaxError::LopsidedSplit);
        }

        Ok(())
    }

    /// Component-wise addition, used to aggregate line breakdowns
    pub fn checked_add(&self, other: &TaxBreakdown) -> Result<TaxBreakdown, TaxError> {
        Ok(Self {
            subtotal: self.subtotal.checked_add(&other.subtotal)?,
            discount: self.discount.checked_add(&other.discount)?,
            taxable_amount: self.taxable_amount.checked_add(&other.taxable_amount)?,
            cgst: self.cgst.checked_add(&other.cgst)?,
            sgst: self.sgst.checked_add(&other.sgst)?,
            igst: self.igst.checked_add(&other.igst)?,
            total: self.total.checked_add(&other.total)?,
        })
    }

    /// Sums a sequence of breakdowns into one aggregate
    ///
    /// Note that the aggregate of valid per-line breakdowns can legitimately
    /// mix jurisdictions (one intra-state line and one exempt line is fine),
    /// so the sum is not re-validated against the split rule.
    pub fn sum<I>(currency: Currency, breakdowns: I) -> Result<TaxBreakdown, TaxError>
    where
        I: IntoIterator<Item = TaxBreakdown>,
    {
        breakdowns
            .into_iter()
            .try_fold(Self::zero(currency), |acc, b| acc.checked_add(&b))
    }
}
