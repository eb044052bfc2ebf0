//! Invoice aggregate and line items
//!
//! An invoice starts life as a draft, accumulates line items priced by the
//! service catalog, and freezes them at issue. From that point its balance
//! and settlement status are driven exclusively by the payment and
//! credit-note logs (see [`crate::ledger`]).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{Currency, InvoiceId, LineItemId, Money, PatientId, TaxBreakdown};

use crate::error::BillingError;

/// Statuses set only by explicit administrative action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdministrativeStatus {
    /// Invoice is being drafted; line items are editable
    Draft,
    /// Invoice was voided; terminal
    Cancelled,
}

/// Statuses derived from the balance projection, never set by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Issued, nothing settled yet
    Pending,
    /// Some but not all of the total settled
    PartiallyPaid,
    /// Balance fully settled; terminal
    Paid,
    /// Nothing settled and past the due date
    Overdue,
}

/// Invoice status as a tagged computation
///
/// The administrative branch holds the statuses a person sets; the derived
/// branch holds the statuses the ledger computes. Keeping them in separate
/// arms means the derivation function never has to special-case anything:
/// it simply does not apply to the administrative branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status")]
pub enum InvoiceStatus {
    Administrative(AdministrativeStatus),
    Derived(SettlementStatus),
}

impl InvoiceStatus {
    pub fn draft() -> Self {
        InvoiceStatus::Administrative(AdministrativeStatus::Draft)
    }

    pub fn cancelled() -> Self {
        InvoiceStatus::Administrative(AdministrativeStatus::Cancelled)
    }

    pub fn is_draft(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Administrative(AdministrativeStatus::Draft)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Administrative(AdministrativeStatus::Cancelled)
        )
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Derived(SettlementStatus::Paid))
    }

    /// Paid and Cancelled are the terminal statuses
    pub fn is_terminal(&self) -> bool {
        self.is_paid() || self.is_cancelled()
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvoiceStatus::Administrative(AdministrativeStatus::Draft) => "DRAFT",
            InvoiceStatus::Administrative(AdministrativeStatus::Cancelled) => "CANCELLED",
            InvoiceStatus::Derived(SettlementStatus::Pending) => "PENDING",
            InvoiceStatus::Derived(SettlementStatus::PartiallyPaid) => "PARTIALLY_PAID",
            InvoiceStatus::Derived(SettlementStatus::Paid) => "PAID",
            InvoiceStatus::Derived(SettlementStatus::Overdue) => "OVERDUE",
        };
        write!(f, "{label}")
    }
}

/// A billable line on an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Line identifier
    pub id: LineItemId,
    /// Catalog service code the line was priced from
    pub service_code: String,
    /// Description
    pub description: String,
    /// Quantity
    pub quantity: Decimal,
    /// Unit price supplied by the catalog
    pub unit_price: Money,
    /// The line's monetary breakdown (subtotal, discount, GST, total)
    pub breakdown: TaxBreakdown,
}

impl LineItem {
    /// Creates a new line item
    pub fn new(
        service_code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Money,
        breakdown: TaxBreakdown,
    ) -> Self {
        Self {
            id: LineItemId::new_v7(),
            service_code: service_code.into(),
            description: description.into(),
            quantity,
            unit_price,
            breakdown,
        }
    }

    /// Quantity times unit price, before discount and tax
    pub fn gross(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Checks the line's own invariants
    pub fn validate(&self, index: usize) -> Result<(), BillingError> {
        if self.quantity <= Decimal::ZERO {
            return Err(BillingError::QuantityNotPositive {
                index,
                quantity: self.quantity,
            });
        }
        self.breakdown
            .validate()
            .map_err(|source| BillingError::InvalidLine { index, source })?;

        let expected = self.gross().round_to_currency();
        if self.breakdown.subtotal() != expected {
            return Err(BillingError::LineSubtotalMismatch {
                index,
                subtotal: self.breakdown.subtotal().amount(),
                expected: expected.amount(),
            });
        }
        Ok(())
    }
}

/// A patient invoice
///
/// `paid_amount` and `credited_amount` are caches of the balance projection
/// (see [`crate::ledger::recompute_balance`]); any divergence between cache
/// and recomputation is a data-integrity error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable, unique, immutable once issued)
    pub invoice_number: String,
    /// Patient being billed (reference into the patient directory)
    pub patient_id: PatientId,
    /// Issue date
    pub issue_date: NaiveDate,
    /// Due date
    pub due_date: NaiveDate,
    /// Currency
    pub currency: Currency,
    /// Line items; frozen once issued
    pub line_items: Vec<LineItem>,
    /// Aggregate breakdown across all lines
    pub totals: TaxBreakdown,
    /// Cached sum of recorded payments
    pub paid_amount: Money,
    /// Cached sum of adjusted credit notes
    pub credited_amount: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice with no line items
    pub fn draft(
        invoice_number: impl Into<String>,
        patient_id: PatientId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InvoiceId::new_v7(),
            invoice_number: invoice_number.into(),
            patient_id,
            issue_date,
            due_date,
            currency,
            line_items: Vec::new(),
            totals: TaxBreakdown::zero(currency),
            paid_amount: Money::zero(currency),
            credited_amount: Money::zero(currency),
            status: InvoiceStatus::draft(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a line item to a draft invoice
    ///
    /// # Errors
    ///
    /// Returns `LineItemsFrozen` once the invoice has been issued.
    pub fn add_line(&mut self, line: LineItem) -> Result<(), BillingError> {
        self.ensure_editable()?;
        self.line_items.push(line);
        self.recalculate_totals()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Removes a line item from a draft invoice
    pub fn remove_line(&mut self, line_id: LineItemId) -> Result<(), BillingError> {
        self.ensure_editable()?;
        self.line_items.retain(|l| l.id != line_id);
        self.recalculate_totals()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Issues the invoice: validates every line, freezes them, and moves
    /// the status from Draft to the derived Pending.
    ///
    /// # Errors
    ///
    /// - `AlreadyIssued` if the invoice is not a draft
    /// - `EmptyInvoice` if there are no line items
    /// - line-level errors if any breakdown invariant is violated
    pub fn issue(&mut self) -> Result<(), BillingError> {
        if !self.status.is_draft() {
            return Err(BillingError::AlreadyIssued {
                status: self.status.to_string(),
            });
        }
        if self.line_items.is_empty() {
            return Err(BillingError::EmptyInvoice);
        }
        for (index, line) in self.line_items.iter().enumerate() {
            line.validate(index)?;
        }
        self.recalculate_totals()?;
        self.status = InvoiceStatus::Derived(SettlementStatus::Pending);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancels the invoice (explicit administrative action)
    ///
    /// # Errors
    ///
    /// Returns `CannotCancel` for invoices that are already paid or cancelled.
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::CannotCancel {
                invoice_number: self.invoice_number.clone(),
                status: self.status.to_string(),
            });
        }
        self.status = InvoiceStatus::cancelled();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The invoice total (sum of line totals)
    pub fn total_amount(&self) -> Money {
        self.totals.total()
    }

    /// Payments plus adjusted credits
    pub fn settled_amount(&self) -> Money {
        self.paid_amount + self.credited_amount
    }

    /// Amount still owed: total minus payments minus adjusted credits
    pub fn balance_amount(&self) -> Money {
        self.total_amount() - self.settled_amount()
    }

    fn ensure_editable(&self) -> Result<(), BillingError> {
        if !self.status.is_draft() {
            return Err(BillingError::LineItemsFrozen {
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn recalculate_totals(&mut self) -> Result<(), BillingError> {
        self.totals = TaxBreakdown::sum(
            self.currency,
            self.line_items.iter().map(|l| l.breakdown),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Rate;
    use rust_decimal_macros::dec;

    fn consultation_line() -> LineItem {
        let unit_price = Money::new(dec!(1000), Currency::INR);
        let breakdown = TaxBreakdown::intra(
            unit_price,
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap();
        LineItem::new("CONS-GEN", "General consultation", dec!(1), unit_price, breakdown)
    }

    fn draft_invoice() -> Invoice {
        Invoice::draft(
            "INV-000001",
            PatientId::new(),
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            Currency::INR,
        )
    }

    #[test]
    fn test_draft_starts_empty() {
        let invoice = draft_invoice();
        assert!(invoice.status.is_draft());
        assert!(invoice.line_items.is_empty());
        assert!(invoice.total_amount().is_zero());
    }

    #[test]
    fn test_add_line_recalculates_totals() {
        let mut invoice = draft_invoice();
        invoice.add_line(consultation_line()).unwrap();

        assert_eq!(invoice.total_amount().amount(), dec!(1180));
        assert_eq!(invoice.totals.cgst().amount(), dec!(90));
    }

    #[test]
    fn test_issue_freezes_line_items() {
        let mut invoice = draft_invoice();
        invoice.add_line(consultation_line()).unwrap();
        invoice.issue().unwrap();

        assert_eq!(
            invoice.status,
            InvoiceStatus::Derived(SettlementStatus::Pending)
        );
        let err = invoice.add_line(consultation_line()).unwrap_err();
        assert!(matches!(err, BillingError::LineItemsFrozen { .. }));
    }

    #[test]
    fn test_issue_rejects_empty_invoice() {
        let mut invoice = draft_invoice();
        assert!(matches!(invoice.issue(), Err(BillingError::EmptyInvoice)));
        assert!(invoice.status.is_draft());
    }

    #[test]
    fn test_issue_rejects_bad_line_subtotal() {
        let mut invoice = draft_invoice();
        let unit_price = Money::new(dec!(1000), Currency::INR);
        // Breakdown priced for 1000 but quantity is 2
        let breakdown = TaxBreakdown::intra(
            unit_price,
            Money::zero(Currency::INR),
            Rate::from_percentage(dec!(18)),
        )
        .unwrap();
        invoice
            .add_line(LineItem::new("LAB-CBC", "CBC panel", dec!(2), unit_price, breakdown))
            .unwrap();

        assert!(matches!(
            invoice.issue(),
            Err(BillingError::LineSubtotalMismatch { .. })
        ));
        assert!(invoice.status.is_draft());
    }

    #[test]
    fn test_issue_rejects_non_positive_quantity() {
        let mut invoice = draft_invoice();
        let unit_price = Money::new(dec!(1000), Currency::INR);
        let breakdown = TaxBreakdown::exempt(Money::zero(Currency::INR), Money::zero(Currency::INR))
            .unwrap();
        invoice
            .add_line(LineItem::new("MISC", "Misc", dec!(0), unit_price, breakdown))
            .unwrap();

        assert!(matches!(
            invoice.issue(),
            Err(BillingError::QuantityNotPositive { .. })
        ));
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut invoice = draft_invoice();
        invoice.cancel().unwrap();
        assert!(invoice.status.is_cancelled());
        assert!(matches!(
            invoice.cancel(),
            Err(BillingError::CannotCancel { .. })
        ));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(InvoiceStatus::draft().to_string(), "DRAFT");
        assert_eq!(
            InvoiceStatus::Derived(SettlementStatus::PartiallyPaid).to_string(),
            "PARTIALLY_PAID"
        );
    }
}
