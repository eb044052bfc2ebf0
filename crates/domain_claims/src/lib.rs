//! Insurance Claims Domain
//!
//! This crate implements the claim lifecycle from submission through
//! third-party administrator (TPA) adjudication:
//!
//! ```text
//! SUBMITTED -> SUBMITTED_TO_TPA -> APPROVED
//!                  |    ^              REJECTED
//!                  v    |
//!              INFO_REQUESTED
//! ```
//!
//! A claim references exactly one invoice and never mutates it: approval
//! records the payer's committed amount, and reconciling that money into
//! the invoice ledger is a separate, deliberate payment application.

pub mod claim;
pub mod error;
pub mod workflow;

pub use claim::{ClaimDocument, ClaimStatus, InsuranceClaim};
pub use error::ClaimError;
pub use workflow::{apply_action, ClaimAction};
