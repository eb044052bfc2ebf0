//! Core Kernel - Foundational types for the hospital billing ledger
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - GST tax breakdowns (CGST/SGST/IGST splits) with their consistency invariants
//! - Common identifiers and value objects

pub mod error;
pub mod identifiers;
pub mod money;
pub mod tax;

pub use error::CoreError;
pub use identifiers::{
    ClaimId, CreditNoteId, DocumentId, InsurerId, InvoiceId, LineItemId, PatientId, PaymentId,
    ReceiptId,
};
pub use money::{Currency, Money, MoneyError, Rate};
pub use tax::{TaxBreakdown, TaxError, TaxSplit};
