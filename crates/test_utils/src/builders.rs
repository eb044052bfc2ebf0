//! Test Data Builders
//!
//! Builder patterns for constructing test documents with sensible defaults.
//! Tests specify only the fields they care about.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Currency, InsurerId, Money, PatientId, Rate, TaxBreakdown};
use domain_billing::{Invoice, LineItem};
use domain_claims::InsuranceClaim;
use infra_store::{LedgerStore, Versioned};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, StringFixtures, TemporalFixtures};

/// Seeds a fresh store with one invoice and returns both
pub fn store_with(invoice: Invoice) -> (Arc<LedgerStore>, Versioned<Invoice>) {
    let store = Arc::new(LedgerStore::new());
    let stored = store
        .insert_invoice(invoice)
        .expect("seed invoice must store");
    (store, stored)
}

/// Builder for test invoices
///
/// Defaults to the canonical single-consultation invoice: ₹1,000 taxable at
/// 18% intra-state GST, total ₹1,180, issued.
pub struct TestInvoiceBuilder {
    invoice_number: String,
    patient_id: PatientId,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency: Currency,
    lines: Vec<(String, Decimal, Decimal, Rate)>,
    issued: bool,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    pub fn new() -> Self {
        Self {
            invoice_number: "INV-TEST-0001".to_string(),
            patient_id: IdFixtures::patient_id(),
            issue_date: TemporalFixtures::issue_date(),
            due_date: TemporalFixtures::due_date(),
            currency: Currency::INR,
            lines: vec![(
                StringFixtures::service_code().to_string(),
                dec!(1),
                dec!(1000),
                Rate::from_percentage(dec!(18)),
            )],
            issued: true,
        }
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_patient_id(mut self, id: PatientId) -> Self {
        self.patient_id = id;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Replaces the default line set
    pub fn with_line(
        mut self,
        service_code: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        gst_rate: Rate,
    ) -> Self {
        self.lines = vec![(service_code.into(), quantity, unit_price, gst_rate)];
        self
    }

    /// Appends a line to the current set
    pub fn add_line(
        mut self,
        service_code: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        gst_rate: Rate,
    ) -> Self {
        self.lines
            .push((service_code.into(), quantity, unit_price, gst_rate));
        self
    }

    /// Leaves the invoice as a draft instead of issuing it
    pub fn as_draft(mut self) -> Self {
        self.issued = false;
        self
    }

    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::draft(
            self.invoice_number,
            self.patient_id,
            self.issue_date,
            self.due_date,
            self.currency,
        );
        for (service_code, quantity, unit_price, gst_rate) in self.lines {
            let unit_price = Money::new(unit_price, self.currency);
            let subtotal = unit_price.multiply(quantity).round_to_currency();
            let breakdown =
                TaxBreakdown::intra(subtotal, Money::zero(self.currency), gst_rate)
                    .expect("builder breakdown must be valid");
            invoice
                .add_line(LineItem::new(
                    service_code.clone(),
                    format!("Test line {service_code}"),
                    quantity,
                    unit_price,
                    breakdown,
                ))
                .expect("builder line must be addable");
        }
        if self.issued {
            invoice.issue().expect("builder invoice must issue");
        }
        invoice
    }
}

/// Builder for test claims
pub struct TestClaimBuilder {
    claim_number: String,
    patient_id: PatientId,
    insurer_id: InsurerId,
    policy_number: String,
    claim_amount: Decimal,
    coverage_percentage: Decimal,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    pub fn new() -> Self {
        Self {
            claim_number: "CLM-TEST-0001".to_string(),
            patient_id: IdFixtures::patient_id(),
            insurer_id: IdFixtures::insurer_id(),
            policy_number: StringFixtures::policy_number().to_string(),
            claim_amount: dec!(1000),
            coverage_percentage: dec!(80),
        }
    }

    pub fn with_claim_number(mut self, number: impl Into<String>) -> Self {
        self.claim_number = number.into();
        self
    }

    pub fn with_claim_amount(mut self, amount: Decimal) -> Self {
        self.claim_amount = amount;
        self
    }

    pub fn with_coverage(mut self, percentage: Decimal) -> Self {
        self.coverage_percentage = percentage;
        self
    }

    /// Builds the claim against the given invoice
    pub fn build_against(self, invoice: &Invoice) -> InsuranceClaim {
        InsuranceClaim::submit(
            self.claim_number,
            invoice.id,
            self.patient_id,
            self.insurer_id,
            self.policy_number,
            Money::new(self.claim_amount, invoice.currency),
            Rate::from_percentage(self.coverage_percentage),
            invoice.total_amount(),
        )
        .expect("builder claim must submit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_invoice_is_the_canonical_consultation() {
        let invoice = TestInvoiceBuilder::new().build();
        assert_eq!(invoice.total_amount().amount(), dec!(1180));
        assert!(!invoice.status.is_draft());
    }

    #[test]
    fn test_draft_builder_leaves_invoice_editable() {
        let invoice = TestInvoiceBuilder::new().as_draft().build();
        assert!(invoice.status.is_draft());
    }

    #[test]
    fn test_claim_builder_binds_to_invoice_total() {
        let invoice = TestInvoiceBuilder::new().build();
        let claim = TestClaimBuilder::new()
            .with_claim_amount(dec!(1180))
            .build_against(&invoice);
        assert_eq!(claim.invoice_id, invoice.id);
        assert_eq!(claim.claim_amount.amount(), dec!(1180));
    }
}
