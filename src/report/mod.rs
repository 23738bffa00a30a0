//! Report rendering.

pub mod format;
pub mod generator;

pub use generator::{
    generate_chat_reply, generate_invoice_page, generate_json_report, generate_markdown_report,
    generate_query_table, write_output, DashboardReport, ReportMetadata,
};
