//! Mock collaborator adapters
//!
//! In-memory implementations of the collaborator ports, used by the test
//! suites and by any host that wants to run the core without its real
//! surroundings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal_macros::dec;

use core_kernel::{Currency, DocumentId, Money, PatientId, Rate};

use crate::ports::{
    CatalogEntry, ClaimDocumentStore, Collaborators, Notification, NotificationSink, PatientDirectory,
    PatientSummary, PortError, ServiceCatalog, TaxClass,
};

/// A patient directory backed by a fixed map
#[derive(Debug, Default)]
pub struct StaticPatientDirectory {
    patients: HashMap<PatientId, PatientSummary>,
}

impl StaticPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, id: PatientId, display_name: impl Into<String>) -> Self {
        self.patients.insert(
            id,
            PatientSummary {
                id,
                display_name: display_name.into(),
                registration_number: None,
            },
        );
        self
    }
}

#[async_trait]
impl PatientDirectory for StaticPatientDirectory {
    async fn resolve(&self, id: PatientId) -> Result<PatientSummary, PortError> {
        self.patients
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Patient", id))
    }
}

/// A service catalog backed by a fixed map
#[derive(Debug, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        service_code: impl Into<String>,
        description: impl Into<String>,
        unit_price: Money,
        tax_class: TaxClass,
    ) -> Self {
        let service_code = service_code.into();
        self.entries.insert(
            service_code.clone(),
            CatalogEntry {
                service_code,
                description: description.into(),
                unit_price,
                tax_class,
            },
        );
        self
    }

    /// A small INR catalog covering the common cases: a taxed consultation,
    /// an exempt dressing, and an inter-state teleconsultation
    pub fn standard() -> Self {
        let inr = |d| Money::new(d, Currency::INR);
        Self::new()
            .with_entry(
                "CONS-GEN",
                "General consultation",
                inr(dec!(1000)),
                TaxClass::IntraState {
                    rate: Rate::from_percentage(dec!(18)),
                },
            )
            .with_entry(
                "WARD-GEN",
                "General ward (per day)",
                inr(dec!(2500)),
                TaxClass::IntraState {
                    rate: Rate::from_percentage(dec!(12)),
                },
            )
            .with_entry(
                "DRESS-MIN",
                "Minor dressing",
                inr(dec!(300)),
                TaxClass::Exempt,
            )
            .with_entry(
                "TELE-SPEC",
                "Specialist teleconsultation",
                inr(dec!(1500)),
                TaxClass::InterState {
                    rate: Rate::from_percentage(dec!(18)),
                },
            )
    }
}

#[async_trait]
impl ServiceCatalog for StaticCatalog {
    async fn lookup(&self, service_code: &str) -> Result<CatalogEntry, PortError> {
        self.entries
            .get(service_code)
            .cloned()
            .ok_or_else(|| PortError::not_found("CatalogEntry", service_code))
    }
}

/// A document store that tracks known references in memory
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashSet<DocumentId>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new document and returns its reference
    pub fn add(&self) -> DocumentId {
        let id = DocumentId::new_v7();
        self.documents.lock().insert(id);
        id
    }
}

#[async_trait]
impl ClaimDocumentStore for InMemoryDocumentStore {
    async fn exists(&self, id: DocumentId) -> Result<bool, PortError> {
        Ok(self.documents.lock().contains(&id))
    }
}

/// A notification sink that records everything it is asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), PortError> {
        self.sent.lock().push(notification);
        Ok(())
    }
}

/// A notification sink that always fails, for exercising the
/// fire-and-forget contract
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl NotificationSink for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), PortError> {
        Err(PortError::unavailable("notification-service"))
    }
}

/// Bundles mock collaborators around the given document store and notifier
pub fn mock_collaborators(
    directory: StaticPatientDirectory,
    documents: Arc<InMemoryDocumentStore>,
    notifier: Arc<RecordingNotifier>,
) -> Collaborators {
    Collaborators {
        directory: Arc::new(directory),
        catalog: Arc::new(StaticCatalog::standard()),
        documents,
        notifications: notifier,
    }
}
