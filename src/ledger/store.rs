//! JSON-backed invoice collection.

use crate::models::{Invoice, InvoiceStatus};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The current invoice collection and the file it is persisted to.
#[derive(Debug, Clone)]
pub struct InvoiceStore {
    path: PathBuf,
    invoices: Vec<Invoice>,
}

impl InvoiceStore {
    /// Create a store over an in-memory collection.
    pub fn new(path: PathBuf, invoices: Vec<Invoice>) -> Self {
        Self { path, invoices }
    }

    /// Load the collection from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read invoices file: {}", path.display()))?;

        let invoices: Vec<Invoice> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse invoices file: {}", path.display()))?;

        debug!("Loaded {} invoices from {}", invoices.len(), path.display());

        Ok(Self::new(path.to_path_buf(), invoices))
    }

    /// Write the collection back to its file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.invoices)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write invoices file: {}", self.path.display()))?;

        debug!("Saved {} invoices to {}", self.invoices.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Find an invoice by id or invoice number.
    pub fn find(&self, key: &str) -> Option<&Invoice> {
        self.invoices
            .iter()
            .find(|inv| inv.id == key || inv.invoice_number == key)
    }

    /// Change the status of one invoice.
    ///
    /// Returns the previous status. The caller persists with [`save`](Self::save).
    pub fn update_status(&mut self, key: &str, status: InvoiceStatus) -> Result<InvoiceStatus> {
        let Some(invoice) = self
            .invoices
            .iter_mut()
            .find(|inv| inv.id == key || inv.invoice_number == key)
        else {
            bail!("No invoice with id or number '{}'", key);
        };

        let previous = invoice.status;
        invoice.status = status;

        info!(
            "Invoice {} status: {} -> {}",
            invoice.invoice_number, previous, status
        );

        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::{generate_mock_invoices, MockOptions};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_invoices() -> Vec<Invoice> {
        generate_mock_invoices(&MockOptions {
            count: 5,
            seed: Some(9),
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        })
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("invoices.json");

        let store = InvoiceStore::new(path.clone(), sample_invoices());
        store.save().unwrap();

        let loaded = InvoiceStore::load(&path).unwrap();
        assert_eq!(loaded.invoices(), store.invoices());
    }

    #[test]
    fn test_update_status_by_id_and_number() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = InvoiceStore::new(temp_dir.path().join("i.json"), sample_invoices());

        store.update_status("inv_2", InvoiceStatus::Paid).unwrap();
        assert_eq!(store.find("inv_2").unwrap().status, InvoiceStatus::Paid);

        let previous = store
            .update_status("INV-20230002", InvoiceStatus::NotPaid)
            .unwrap();
        assert_eq!(previous, InvoiceStatus::Paid);
        assert_eq!(store.find("inv_2").unwrap().status, InvoiceStatus::NotPaid);
    }

    #[test]
    fn test_update_status_unknown_invoice() {
        let mut store = InvoiceStore::new(PathBuf::from("unused.json"), sample_invoices());
        assert!(store.update_status("inv_999", InvoiceStatus::Paid).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(InvoiceStore::load(&path).is_err());
    }
}
