//! Billing domain errors

use core_kernel::{MoneyError, TaxError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Tax(#[from] TaxError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    /// An invoice cannot be issued without line items
    #[error("Invoice has no line items")]
    EmptyInvoice,

    /// A line item failed its tax breakdown invariants
    #[error("Line {index}: {source}")]
    InvalidLine { index: usize, source: TaxError },

    /// A line item quantity must be strictly positive
    #[error("Line {index}: quantity {quantity} must be positive")]
    QuantityNotPositive { index: usize, quantity: Decimal },

    /// A line item subtotal must equal quantity times unit price
    #[error("Line {index}: subtotal {subtotal} does not equal quantity x unit price ({expected})")]
    LineSubtotalMismatch {
        index: usize,
        subtotal: Decimal,
        expected: Decimal,
    },

    /// Line items may only be edited while the invoice is a draft
    #[error("Line items are frozen on a {status} invoice")]
    LineItemsFrozen { status: String },

    /// Issue was attempted on an invoice that is no longer a draft
    #[error("Invoice cannot be issued from status {status}")]
    AlreadyIssued { status: String },

    /// The operation requires an issued invoice
    #[error("Invoice has not been issued (status {status})")]
    InvoiceNotIssued { status: String },

    /// Cancellation attempted from a terminal status
    #[error("Invoice {invoice_number} cannot be cancelled from status {status}")]
    CannotCancel {
        invoice_number: String,
        status: String,
    },

    /// Settlement projections only apply to issued, non-cancelled invoices
    #[error("Settlement cannot be applied to a {status} invoice")]
    SettlementNotApplicable { status: String },

    /// Payment and credit amounts must be strictly positive
    #[error("Amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    /// Overpayment is never permitted
    #[error("Payment of {attempted} exceeds outstanding balance {balance}")]
    Overpayment { attempted: Decimal, balance: Decimal },

    /// Non-cash movements must carry an external transaction reference
    #[error("Transaction reference is required for {method} payments")]
    MissingTransactionId { method: String },

    /// Payments are rejected on cancelled and fully paid invoices
    #[error("Payments are not accepted on a {status} invoice")]
    PaymentNotAllowed { status: String },

    /// Credit notes are rejected on cancelled invoices
    #[error("Credit notes are not accepted on a {status} invoice")]
    CreditNotAllowed { status: String },

    /// A credit note cannot exceed what remains billable on the invoice
    #[error("Credit of {attempted} exceeds remaining billable amount {available}")]
    CreditExceedsBillable {
        attempted: Decimal,
        available: Decimal,
    },

    /// Adjusting a note must not push the balance negative; refund the excess
    #[error("Adjusting {attempted} exceeds outstanding balance {balance}; refund instead")]
    CreditExceedsBalance { attempted: Decimal, balance: Decimal },

    /// Adjusted and Refunded credit notes are immutable
    #[error("Credit note is final in status {status}")]
    CreditNoteFinal { status: String },

    /// A payment or credit note was presented against the wrong invoice
    #[error("{document} does not belong to invoice {invoice_number}")]
    DocumentInvoiceMismatch {
        document: String,
        invoice_number: String,
    },

    /// The stored balance cache no longer matches the recomputed projection.
    /// This is a data-integrity defect, never a business state.
    #[error("Stored balance {cached} diverges from recomputed balance {recomputed}")]
    BalanceCacheDiverged { cached: Decimal, recomputed: Decimal },
}
