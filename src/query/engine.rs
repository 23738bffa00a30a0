//! Embedded SQL engine over the invoice collection.
//!
//! Invoices are copied into an in-memory SQLite table named `invoices`
//! whose columns match [`INVOICE_TABLE_SCHEMA`], the same schema the
//! assistant describes to the language model.

use crate::models::Invoice;
use rusqlite::types::ValueRef;
use rusqlite::{params, Batch, Connection};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, info};

/// DDL for the queryable invoice table.
pub const INVOICE_TABLE_SCHEMA: &str = "CREATE TABLE invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT,
    vendor_name TEXT,
    amount REAL,
    due_date TEXT, -- Format YYYY-MM-DD
    processed_date TEXT, -- Format YYYY-MM-DD
    category TEXT,
    status TEXT -- 'paid', 'pending', or 'not paid'
);";

/// Errors raised while running a generated query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Only read-only SELECT queries can be run against your invoices.")]
    NotReadOnly,

    #[error("Only a single SQL statement can be run at a time.")]
    MultipleStatements,

    #[error("The query was empty.")]
    Empty,

    #[error("The query could not be run: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Rows returned by a query. Each row holds one value per entry of
/// `columns`, in select order; column names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Whether rows beyond the row limit were dropped.
    pub truncated: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An in-memory SQLite database holding one snapshot of the invoices.
pub struct QueryEngine {
    conn: Connection,
    max_rows: usize,
}

impl QueryEngine {
    /// Build a database from the current invoice collection.
    pub fn from_invoices(invoices: &[Invoice], max_rows: usize) -> Result<Self, QueryError> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch(INVOICE_TABLE_SCHEMA)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO invoices
                 (id, invoice_number, vendor_name, amount, due_date, processed_date, category, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )?;

            for inv in invoices {
                stmt.execute(params![
                    inv.id,
                    inv.invoice_number,
                    inv.vendor.name,
                    inv.amount,
                    inv.due_date.format("%Y-%m-%d").to_string(),
                    inv.processed_date.format("%Y-%m-%d").to_string(),
                    inv.category,
                    inv.status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        conn.pragma_update(None, "query_only", true)?;

        debug!("Loaded {} invoices into query engine", invoices.len());

        Ok(Self {
            conn,
            max_rows: max_rows.max(1),
        })
    }

    /// Run one read-only statement and collect its rows.
    pub fn run(&self, sql: &str) -> Result<QueryResult, QueryError> {
        info!("Running query: {}", sql.trim());

        let mut batch = Batch::new(&self.conn, sql);
        let mut stmt = batch.next()?.ok_or(QueryError::Empty)?;
        // Anything after the first statement other than whitespace or comments
        if !matches!(batch.next(), Ok(None)) {
            return Err(QueryError::MultipleStatements);
        }
        if !stmt.readonly() {
            return Err(QueryError::NotReadOnly);
        }

        let mut result = QueryResult {
            columns: stmt.column_names().into_iter().map(String::from).collect(),
            ..Default::default()
        };
        let width = result.columns.len();

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            if result.rows.len() >= self.max_rows {
                result.truncated = true;
                break;
            }

            let record = (0..width)
                .map(|i| row.get_ref(i).map(to_json))
                .collect::<Result<Vec<_>, _>>()?;
            result.rows.push(record);
        }

        debug!(
            "Query returned {} rows (truncated: {})",
            result.rows.len(),
            result.truncated
        );

        Ok(result)
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, Vendor};
    use chrono::NaiveDate;

    fn invoice(n: usize, vendor: &str, amount: f64, status: InvoiceStatus) -> Invoice {
        let processed = NaiveDate::from_ymd_opt(2024, 1, n as u32).unwrap();
        Invoice {
            id: format!("inv_{}", n),
            invoice_number: format!("INV-{}", 20230000 + n),
            vendor: Vendor::new(format!("ven_{}", n), vendor),
            amount,
            due_date: processed + chrono::Duration::days(30),
            processed_date: processed,
            category: "Software".to_string(),
            status,
        }
    }

    fn engine() -> QueryEngine {
        let invoices = vec![
            invoice(1, "Cloud Services LLC", 100.0, InvoiceStatus::Paid),
            invoice(2, "Legal Advisors", 250.5, InvoiceStatus::NotPaid),
            invoice(3, "Cloud Services LLC", 300.0, InvoiceStatus::Pending),
        ];
        QueryEngine::from_invoices(&invoices, 100).unwrap()
    }

    #[test]
    fn test_sum_query() {
        let result = engine().run("SELECT SUM(amount) FROM invoices;").unwrap();
        assert_eq!(result.columns, vec!["SUM(amount)"]);
        assert_eq!(result.rows[0], vec![Value::from(650.5)]);
    }

    #[test]
    fn test_group_by_vendor_with_sum() {
        // Both a SUM and a GROUP BY are honoured together
        let result = engine()
            .run(
                "SELECT vendor_name, SUM(amount) AS total_spend FROM invoices \
                 GROUP BY vendor_name ORDER BY total_spend DESC LIMIT 5",
            )
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.columns, vec!["vendor_name", "total_spend"]);
        assert_eq!(
            result.rows[0],
            vec![Value::from("Cloud Services LLC"), Value::from(400.0)]
        );
    }

    #[test]
    fn test_status_filter_uses_stored_labels() {
        let result = engine()
            .run("SELECT invoice_number, due_date FROM invoices WHERE status = 'not paid'")
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(
            result.rows[0],
            vec![Value::from("INV-20230002"), Value::from("2024-02-01")]
        );
    }

    #[test]
    fn test_date_comparison() {
        let result = engine()
            .run("SELECT COUNT(*) AS n FROM invoices WHERE processed_date >= '2024-01-02'")
            .unwrap();
        assert_eq!(result.rows[0], vec![Value::from(2)]);
    }

    #[test]
    fn test_rejects_writes() {
        let engine = engine();
        assert!(matches!(
            engine.run("DELETE FROM invoices"),
            Err(QueryError::NotReadOnly)
        ));
        assert!(matches!(
            engine.run("SELECT 1; DROP TABLE invoices"),
            Err(QueryError::MultipleStatements)
        ));
        assert!(matches!(
            engine.run("-- nothing to run"),
            Err(QueryError::Empty)
        ));
    }

    #[test]
    fn test_semicolon_inside_literal_is_one_statement() {
        let result = engine()
            .run("SELECT COUNT(*) AS n FROM invoices WHERE vendor_name <> 'A;B';")
            .unwrap();
        assert_eq!(result.rows[0], vec![Value::from(3)]);
    }

    #[test]
    fn test_leading_comment_is_allowed() {
        let result = engine()
            .run("-- unpaid total\nSELECT SUM(amount) FROM invoices WHERE status != 'paid'")
            .unwrap();
        assert_eq!(result.rows[0], vec![Value::from(550.5)]);
    }

    #[test]
    fn test_duplicate_column_names_keep_every_value() {
        let result = engine()
            .run("SELECT amount, amount * 2 AS amount FROM invoices WHERE id = 'inv_1'")
            .unwrap();
        assert_eq!(result.columns, vec!["amount", "amount"]);
        assert_eq!(result.rows[0], vec![Value::from(100.0), Value::from(200.0)]);
    }

    #[test]
    fn test_row_limit_truncates() {
        let invoices: Vec<Invoice> = (1..=20)
            .map(|n| invoice(n, "Vendor", n as f64, InvoiceStatus::Paid))
            .collect();
        let engine = QueryEngine::from_invoices(&invoices, 10).unwrap();

        let result = engine.run("SELECT id FROM invoices").unwrap();
        assert_eq!(result.rows.len(), 10);
        assert!(result.truncated);
    }

    #[test]
    fn test_invalid_sql_is_an_error() {
        assert!(matches!(
            engine().run("SELECT nope FROM invoices"),
            Err(QueryError::Sqlite(_))
        ));
    }
}
