//! Ledger configuration

use infra_store::DocumentNumbers;
use serde::Deserialize;

/// Configuration for the billing core
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Prefix for invoice numbers
    pub invoice_prefix: String,
    /// Prefix for credit note numbers
    pub credit_note_prefix: String,
    /// Prefix for claim numbers
    pub claim_prefix: String,
    /// Due date offset applied when a draft does not carry one
    pub default_due_days: u64,
    /// Log level
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            invoice_prefix: "INV".to_string(),
            credit_note_prefix: "CRN".to_string(),
            claim_prefix: "CLM".to_string(),
            default_due_days: 30,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from the environment (prefix `LEDGER_`),
    /// reading a `.env` file first when one is present
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        config::Config::builder()
            .add_source(config::Environment::with_prefix("LEDGER"))
            .build()?
            .try_deserialize()
    }

    /// Builds the document number sequences from the configured prefixes
    pub fn document_numbers(&self) -> DocumentNumbers {
        DocumentNumbers::new(
            self.invoice_prefix.clone(),
            self.credit_note_prefix.clone(),
            self.claim_prefix.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.invoice_prefix, "INV");
        assert_eq!(config.default_due_days, 30);
    }

    #[test]
    fn test_document_numbers_use_configured_prefixes() {
        let config = LedgerConfig {
            invoice_prefix: "HOSP-INV".to_string(),
            ..LedgerConfig::default()
        };
        let numbers = config.document_numbers();
        assert!(numbers.invoices.next().starts_with("HOSP-INV-"));
    }
}
