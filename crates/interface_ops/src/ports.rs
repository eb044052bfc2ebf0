//! Ports to external collaborators
//!
//! The billing core consumes four read-only or fire-and-forget surfaces:
//! the patient directory, the price/service catalog, the claim document
//! store, and the notification/printing surface. Each is a trait here;
//! adapters live with whatever hosts the core. Mock implementations for
//! tests are in [`crate::mocks`].

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use core_kernel::{DocumentId, Money, PatientId, Rate, TaxBreakdown, TaxError};
use domain_claims::ClaimStatus;

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The external system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// An internal error occurred in the adapter
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a ServiceUnavailable error
    pub fn unavailable(service: impl Into<String>) -> Self {
        PortError::ServiceUnavailable {
            service: service.into(),
        }
    }

    /// Returns true if this error indicates a transient failure that may
    /// succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::ServiceUnavailable { .. })
    }
}

/// What the patient directory resolves a reference to
#[derive(Debug, Clone)]
pub struct PatientSummary {
    pub id: PatientId,
    pub display_name: String,
    pub registration_number: Option<String>,
}

/// Tax classification supplied by the catalog; never derived by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxClass {
    /// No GST applies
    Exempt,
    /// Intra-state supply: the rate splits into CGST + SGST
    IntraState { rate: Rate },
    /// Inter-state supply: the full rate as IGST
    InterState { rate: Rate },
}

impl TaxClass {
    /// Builds the breakdown for a line priced under this classification
    pub fn breakdown(&self, subtotal: Money, discount: Money) -> Result<TaxBreakdown, TaxError> {
        match self {
            TaxClass::Exempt => TaxBreakdown::exempt(subtotal, discount),
            TaxClass::IntraState { rate } => TaxBreakdown::intra(subtotal, discount, *rate),
            TaxClass::InterState { rate } => TaxBreakdown::inter(subtotal, discount, *rate),
        }
    }
}

/// A priced catalog entry
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub service_code: String,
    pub description: String,
    pub unit_price: Money,
    pub tax_class: TaxClass,
}

/// Outbound correspondence; fire-and-forget, never part of correctness
#[derive(Debug, Clone)]
pub enum Notification {
    /// A payment receipt for printing/messaging
    ReceiptIssued {
        invoice_number: String,
        patient_name: String,
        amount: Money,
    },
    /// Claim correspondence after submission or a status change
    ClaimCorrespondence {
        claim_number: String,
        status: ClaimStatus,
    },
}

/// Resolves patient references for display; read-only
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn resolve(&self, id: PatientId) -> Result<PatientSummary, PortError>;
}

/// Supplies unit prices and tax classification at invoice draft time; read-only
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn lookup(&self, service_code: &str) -> Result<CatalogEntry, PortError>;
}

/// Stores claim documents; the core only ever checks that a reference exists
#[async_trait]
pub trait ClaimDocumentStore: Send + Sync {
    async fn exists(&self, id: DocumentId) -> Result<bool, PortError>;
}

/// Delivers receipts and claim correspondence
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), PortError>;
}

/// The bundle of collaborator ports the operations run against
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn PatientDirectory>,
    pub catalog: Arc<dyn ServiceCatalog>,
    pub documents: Arc<dyn ClaimDocumentStore>,
    pub notifications: Arc<dyn NotificationSink>,
}
