//! Operations Layer
//!
//! The plain operations the billing core exposes to its calling surfaces
//! (billing screens, claim screens), with no wire format attached;
//! transport is an external collaborator's concern.
//!
//! - [`BillingOps`]: issue/cancel invoices, apply payments, run the credit
//!   note engine, and the read-side queries
//! - [`ClaimsOps`]: submit claims, attach documents, and drive the TPA
//!   adjudication workflow
//! - [`ports`]: the external collaborators the core consumes (patient
//!   directory, service catalog, document store, notifications)
//! - [`error::OpsError`]: the five error kinds surfaced to callers
//!
//! Every mutating operation is atomic and serializable per document: it
//! reads one versioned invoice or claim, validates, and commits through the
//! store's version gate, surfacing a retriable `Conflict` on stale writes.

pub mod billing;
pub mod claims;
pub mod config;
pub mod error;
pub mod mocks;
pub mod ports;

pub use billing::{
    BillingOps, CreditNoteRequest, DraftLine, InvoiceDraft, PaymentReceipt, PaymentRequest,
    RefundRequest,
};
pub use claims::{ClaimSubmission, ClaimsOps};
pub use config::LedgerConfig;
pub use error::OpsError;
pub use ports::{
    CatalogEntry, ClaimDocumentStore, Collaborators, Notification, NotificationSink,
    PatientDirectory, PatientSummary, PortError, ServiceCatalog, TaxClass,
};
