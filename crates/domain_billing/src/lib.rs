//! Billing Domain - Invoice Ledger, Payments, and Credit Notes
//!
//! This crate owns the monetary documents of the hospital billing core and
//! the rules that keep them consistent:
//!
//! - the **Invoice** aggregate with its frozen-after-issue line items
//! - the **balance projection**: the invoice balance is always re-derivable
//!   from the append-only payment and credit-note logs; the amounts stored
//!   on the invoice are a cache of that projection
//! - **payment application** with its overpayment and method rules
//! - the **credit note engine** for reversing billed amounts, either as a
//!   balance adjustment or an out-of-band cash refund
//!
//! # Invoice Lifecycle
//!
//! ```text
//! DRAFT -> PENDING -> PARTIALLY_PAID -> PAID
//!            |              |
//!            +-> OVERDUE    +-> (credit notes adjust the balance)
//!            +-> CANCELLED (explicit, administrative)
//! ```
//!
//! DRAFT and CANCELLED are administrative statuses set only by explicit
//! action; the settlement statuses are derived from the balance projection
//! and never set by hand.

pub mod credit_note;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod payment;

pub use credit_note::{creditable_amount, CreditNote, CreditNoteStatus};
pub use error::BillingError;
pub use invoice::{AdministrativeStatus, Invoice, InvoiceStatus, LineItem, SettlementStatus};
pub use ledger::{
    apply_projection, derive_status, recompute_balance, verify_cached_balance, BalanceProjection,
};
pub use payment::{validate_application, Payment, PaymentMethod};
