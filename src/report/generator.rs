//! Markdown and JSON report generation.
//!
//! This module renders the dashboard views, the invoice table and
//! assistant answers for the terminal or a report file.

use crate::assistant::{ChatMessage, Sender};
use crate::ledger::table::InvoicePage;
use crate::models::{Dashboard, Invoice, Stats};
use crate::query::QueryResult;
use crate::report::format::{format_currency, format_number, format_short_currency};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Width of the bar column in ranking tables.
const BAR_WIDTH: usize = 20;

/// Metadata about the dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Where the invoices came from.
    pub source: String,
    /// Display name of the signed-in user.
    pub prepared_for: String,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
    /// Total of every unpaid invoice, not only the forecast window.
    pub outstanding_total: f64,
    pub recent_invoices: Vec<Invoice>,
}

/// Generate the dashboard as Markdown.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# SpendLens Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_stats_section(
        &report.dashboard.stats,
        report.outstanding_total,
    ));
    output.push_str(&generate_trend_section(&report.dashboard));
    output.push_str(&generate_vendor_section(&report.dashboard));
    output.push_str(&generate_category_section(&report.dashboard));
    output.push_str(&generate_outflow_section(&report.dashboard));

    if !report.recent_invoices.is_empty() {
        output.push_str("## Recent Invoices\n\n");
        let rows: Vec<&Invoice> = report.recent_invoices.iter().collect();
        output.push_str(&invoice_rows_table(&rows));
        output.push('\n');
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the dashboard as pretty-printed JSON.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Prepared for:** {}\n\n", metadata.prepared_for));

    section
}

/// Generate the stat tiles.
fn generate_stats_section(stats: &Stats, outstanding: f64) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Total Spend | Total Invoices | Documents Uploaded | Avg. Invoice Value | Outstanding |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        format_currency(stats.total_spend),
        format_number(stats.total_invoice_count),
        format_number(stats.documents_uploaded),
        format_currency(stats.average_invoice_value),
        format_currency(outstanding),
    ));

    section
}

fn generate_trend_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Invoice Trends\n\n");
    if dashboard.invoice_trends.is_empty() {
        section.push_str("No invoices processed yet.\n\n");
        return section;
    }

    let max = dashboard
        .invoice_trends
        .iter()
        .map(|t| t.value)
        .fold(0.0, f64::max);

    section.push_str("| Month | Value | Volume | |\n");
    section.push_str("|:---|---:|---:|:---|\n");
    for bucket in &dashboard.invoice_trends {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            bucket.month,
            format_short_currency(bucket.value),
            bucket.volume,
            bar(bucket.value, max),
        ));
    }
    section.push('\n');

    section
}

fn generate_vendor_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Top Vendors by Spend\n\n");
    if dashboard.top_vendors.is_empty() {
        section.push_str("No vendor spend recorded.\n\n");
        return section;
    }

    let max = dashboard.top_vendors.first().map(|v| v.spend).unwrap_or(0.0);

    section.push_str("| # | Vendor | Spend | |\n");
    section.push_str("|---:|:---|---:|:---|\n");
    for (i, vendor) in dashboard.top_vendors.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            i + 1,
            escape(&vendor.name),
            format_currency(vendor.spend),
            bar(vendor.spend, max),
        ));
    }
    section.push('\n');

    section
}

fn generate_category_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Spend by Category\n\n");
    if dashboard.category_spend.is_empty() {
        section.push_str("No category spend recorded.\n\n");
        return section;
    }

    let total = dashboard.stats.total_spend;

    section.push_str("| Category | Spend | Share |\n");
    section.push_str("|:---|---:|---:|\n");
    for category in &dashboard.category_spend {
        let share = if total > 0.0 {
            category.value / total * 100.0
        } else {
            0.0
        };
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            escape(&category.name),
            format_currency(category.value),
            share
        ));
    }
    section.push('\n');

    section
}

fn generate_outflow_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Upcoming Cash Outflow\n\n");
    if dashboard.cash_outflow.is_empty() {
        section.push_str("Nothing outstanding. All invoices are paid.\n\n");
        return section;
    }

    section.push_str("| Due Date | Amount |\n");
    section.push_str("|:---|---:|\n");
    for point in &dashboard.cash_outflow {
        section.push_str(&format!(
            "| {} | {} |\n",
            point.date.format("%b %d, %Y"),
            format_currency(point.amount)
        ));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by SpendLens*\n".to_string()
}

/// Render one page of the invoice table.
pub fn generate_invoice_page(page: &InvoicePage<'_>) -> String {
    let mut output = String::new();

    output.push_str("## Invoices\n\n");
    if page.rows.is_empty() {
        output.push_str("No invoices found.\n");
        return output;
    }

    output.push_str(&invoice_rows_table(&page.rows));
    output.push_str(&format!(
        "\nPage {} of {} ({} invoices)\n",
        page.page,
        page.total_pages,
        format_number(page.total_rows)
    ));

    output
}

fn invoice_rows_table(rows: &[&Invoice]) -> String {
    let mut table = String::new();

    table.push_str("| Invoice | Vendor | Amount | Processed | Due | Category | Status |\n");
    table.push_str("|:---|:---|---:|:---|:---|:---|:---|\n");
    for inv in rows {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} {} |\n",
            escape(&inv.invoice_number),
            escape(&inv.vendor.name),
            format_currency(inv.amount),
            inv.processed_date,
            inv.due_date,
            escape(&inv.category),
            inv.status.emoji(),
            inv.status,
        ));
    }

    table
}

/// Render query rows as a Markdown table.
pub fn generate_query_table(result: &QueryResult) -> String {
    if result.is_empty() {
        return "The query returned no results.\n".to_string();
    }

    let mut table = String::new();

    table.push_str(&format!("| {} |\n", result.columns.join(" | ")));
    table.push_str(&format!(
        "|{}\n",
        result.columns.iter().map(|_| ":---|").collect::<String>()
    ));

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(cell).collect();
        table.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if result.truncated {
        table.push_str(&format!("\n*Showing the first {} rows.*\n", result.rows.len()));
    }

    table
}

/// Render one assistant reply for the terminal.
pub fn generate_chat_reply(message: &ChatMessage) -> String {
    let mut output = String::new();

    if message.sender == Sender::User {
        if let Some(ref text) = message.text {
            output.push_str(&format!("**You:** {}\n", text));
        }
        return output;
    }

    if let Some(ref text) = message.response_text {
        output.push_str(text);
        output.push('\n');
    }
    if let Some(ref sql) = message.sql {
        output.push_str(&format!("\n```sql\n{}\n```\n\n", sql));
    }
    if let Some(ref data) = message.data {
        output.push_str(&generate_query_table(data));
    }
    if let Some(ref error) = message.error {
        output.push_str(&format!("⚠️  {}\n", error));
    }

    output
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Keep a pipe in free text from splitting a Markdown table cell.
fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_dashboard;
    use crate::ledger::table::{paginate, SortConfig};
    use crate::models::{InvoiceStatus, Vendor};
    use chrono::NaiveDate;

    fn invoices() -> Vec<Invoice> {
        let processed = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        vec![
            Invoice {
                id: "inv_1".to_string(),
                invoice_number: "INV-20230001".to_string(),
                vendor: Vendor::new("ven_2", "Cloud Services LLC"),
                amount: 1500.0,
                due_date: processed + chrono::Duration::days(30),
                processed_date: processed,
                category: "Software".to_string(),
                status: InvoiceStatus::Pending,
            },
            Invoice {
                id: "inv_2".to_string(),
                invoice_number: "INV-20230002".to_string(),
                vendor: Vendor::new("ven_8", "Travel Experts"),
                amount: 500.0,
                due_date: processed + chrono::Duration::days(30),
                processed_date: processed,
                category: "Travel".to_string(),
                status: InvoiceStatus::Paid,
            },
        ]
    }

    fn create_test_report(invoices: &[Invoice]) -> DashboardReport {
        DashboardReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                source: "invoices.json".to_string(),
                prepared_for: "Guest User".to_string(),
            },
            dashboard: compute_dashboard(invoices),
            outstanding_total: 1500.0,
            recent_invoices: invoices.to_vec(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let invoices = invoices();
        let markdown = generate_markdown_report(&create_test_report(&invoices));

        assert!(markdown.contains("# SpendLens Dashboard"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("| $2,000 | 2 | 2 | $1,000 | $1,500 |"));
        assert!(markdown.contains("| Jan 24 | $2.0K | 2 |"));
        assert!(markdown.contains("| 1 | Cloud Services LLC | $1,500 |"));
        assert!(markdown.contains("| Software | $1,500 | 75.0% |"));
        assert!(markdown.contains("| Feb 14, 2024 | $1,500 |"));
        assert!(markdown.contains("INV-20230002"));
    }

    #[test]
    fn test_empty_report_sections() {
        let markdown = generate_markdown_report(&create_test_report(&[]));

        assert!(markdown.contains("| $0 | 0 | 0 | $0 |"));
        assert!(markdown.contains("No invoices processed yet."));
        assert!(markdown.contains("Nothing outstanding."));
        assert!(!markdown.contains("## Recent Invoices"));
    }

    #[test]
    fn test_generate_json_report() {
        let invoices = invoices();
        let json = generate_json_report(&create_test_report(&invoices)).unwrap();

        assert!(json.contains("\"total_spend\": 2000.0"));
        assert!(json.contains("\"invoice_trends\""));
        assert!(json.contains("\"cash_outflow\""));
    }

    #[test]
    fn test_generate_invoice_page() {
        let invoices = invoices();
        let page = paginate(&invoices, SortConfig::default(), 1, 10);
        let output = generate_invoice_page(&page);

        assert!(output.contains("Cloud Services LLC"));
        assert!(output.contains("🟢 Paid"));
        assert!(output.contains("Page 1 of 1 (2 invoices)"));
    }

    #[test]
    fn test_generate_query_table() {
        let result = QueryResult {
            columns: vec!["vendor_name".to_string(), "total_spend".to_string()],
            rows: vec![vec![Value::from("A|B"), Value::from(1234.5)]],
            truncated: true,
        };

        let table = generate_query_table(&result);
        assert!(table.starts_with("| vendor_name | total_spend |\n|:---|:---|\n"));
        assert!(table.contains("| A\\|B | 1234.50 |"));
        assert!(table.contains("Showing the first 1 rows."));

        assert_eq!(
            generate_query_table(&QueryResult::default()),
            "The query returned no results.\n"
        );
    }

    #[test]
    fn test_query_table_repeated_column_names() {
        let result = QueryResult {
            columns: vec!["amount".to_string(), "amount".to_string()],
            rows: vec![vec![Value::from(10.0), Value::from(20.0)]],
            truncated: false,
        };

        let table = generate_query_table(&result);
        assert!(table.contains("| 10.00 | 20.00 |"));
    }

    #[test]
    fn test_tables_escape_pipes() {
        let mut invoices = invoices();
        invoices[0].vendor.name = "Smith | Jones".to_string();
        invoices[0].category = "R|D".to_string();

        let page = paginate(&invoices, SortConfig::default(), 1, 10);
        let output = generate_invoice_page(&page);

        assert!(output.contains("| Smith \\| Jones |"));
        assert!(output.contains("| R\\|D |"));

        let markdown = generate_markdown_report(&create_test_report(&invoices));
        assert!(markdown.contains("| 1 | Smith \\| Jones | $1,500 |"));
        assert!(markdown.contains("| R\\|D | $1,500 | 75.0% |"));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5.0, 10.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(5.0, 0.0), "");
    }
}
