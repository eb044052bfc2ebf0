//! Payment records and application rules
//!
//! A payment is immutable once recorded: corrections are issued as a new
//! offsetting payment or a credit note, never an edit. Payments are never
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{InvoiceId, Money, PaymentId};

use crate::error::BillingError;
use crate::invoice::{AdministrativeStatus, Invoice, InvoiceStatus, SettlementStatus};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash at the billing counter
    Cash,
    /// Credit or debit card
    Card,
    /// Bank transfer (NEFT/IMPS/UPI)
    BankTransfer,
    /// Digital wallet
    Wallet,
    /// Cheque
    Cheque,
    /// Insurer remittance against an approved claim
    Insurance,
    /// Other
    Other,
}

impl PaymentMethod {
    /// Every method except cash must carry an external transaction reference
    pub fn requires_transaction_id(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank transfer",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Insurance => "insurance",
            PaymentMethod::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// An immutable payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount (strictly positive)
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// External reference; required for non-cash methods
    pub transaction_id: Option<String>,
    /// When the money was received
    pub received_at: DateTime<Utc>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a payment, validating the amount and method rules
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for zero or negative amounts
    /// - `MissingTransactionId` for non-cash methods without a reference
    pub fn record(
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        transaction_id: Option<String>,
        received_at: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::NonPositiveAmount {
                amount: amount.amount(),
            });
        }
        let has_reference = transaction_id
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if method.requires_transaction_id() && !has_reference {
            return Err(BillingError::MissingTransactionId {
                method: method.to_string(),
            });
        }

        Ok(Self {
            id: PaymentId::new_v7(),
            invoice_id,
            amount,
            method,
            transaction_id,
            received_at,
            created_at: Utc::now(),
        })
    }
}

/// Validates that a payment of `amount` may be applied to `invoice`
///
/// # Errors
///
/// - `InvoiceNotIssued` for drafts
/// - `PaymentNotAllowed` for cancelled or fully paid invoices
/// - `NonPositiveAmount` for zero or negative amounts
/// - `Overpayment` when the amount exceeds the outstanding balance
pub fn validate_application(invoice: &Invoice, amount: Money) -> Result<(), BillingError> {
    match invoice.status {
        InvoiceStatus::Administrative(AdministrativeStatus::Draft) => {
            return Err(BillingError::InvoiceNotIssued {
                status: invoice.status.to_string(),
            });
        }
        InvoiceStatus::Administrative(AdministrativeStatus::Cancelled)
        | InvoiceStatus::Derived(SettlementStatus::Paid) => {
            return Err(BillingError::PaymentNotAllowed {
                status: invoice.status.to_string(),
            });
        }
        InvoiceStatus::Derived(_) => {}
    }

    if !amount.is_positive() {
        return Err(BillingError::NonPositiveAmount {
            amount: amount.amount(),
        });
    }

    let balance = invoice.balance_amount();
    if amount.checked_sub(&balance)?.is_positive() {
        return Err(BillingError::Overpayment {
            attempted: amount.amount(),
            balance: balance.amount(),
        });
    }

    Ok(())
}
