//! Invoice source: mock generation, persistence and the invoice table.

pub mod mock;
pub mod store;
pub mod table;

pub use mock::{generate_mock_invoices, MockOptions};
pub use store::InvoiceStore;
pub use table::{paginate, SortConfig, SortDirection, SortKey};
