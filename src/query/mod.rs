//! Query execution for the ask-your-data assistant.

pub mod engine;

pub use engine::{QueryEngine, QueryError, QueryResult, INVOICE_TABLE_SCHEMA};
