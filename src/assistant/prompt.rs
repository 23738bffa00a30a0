//! System instruction for the ask-your-data assistant.

use crate::query::INVOICE_TABLE_SCHEMA;
use chrono::{Months, NaiveDate};

/// Build the system instruction for a given day.
///
/// The instruction embeds the table schema, today's date and the date one
/// month earlier so relative questions can be turned into date filters.
pub fn system_instruction(today: NaiveDate) -> String {
    let today_str = today.format("%Y-%m-%d").to_string();
    let month_ago = today
        .checked_sub_months(Months::new(1))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string();

    let mut prompt = String::new();

    prompt.push_str("You are an expert SQLite assistant. Your task is to process a user's question about their invoice data and respond in a specific JSON format.\n\n");
    prompt.push_str("The database contains one table with the following schema:\n");
    prompt.push_str(INVOICE_TABLE_SCHEMA);
    prompt.push_str("\n\n");

    prompt.push_str(&format!("- Today's date is {}.\n", today_str));
    prompt.push_str(&format!("- One month ago was {}.\n", month_ago));
    prompt.push_str(&format!(
        "- Dates can be compared directly, e.g., processed_date > '{}'.\n\n",
        month_ago
    ));

    prompt.push_str("Based on the user's prompt, you must decide whether to generate a SQL query or provide a conversational text response.\n\n");
    prompt.push_str("Your entire response MUST be a single, valid JSON object with the following structure:\n");
    prompt.push_str("{\n  \"type\": \"sql\" | \"text\",\n  \"content\": \"...\"\n}\n\n");
    prompt.push_str("- If the user's question can be answered with a SQL query, set \"type\" to \"sql\" and \"content\" to the complete, syntactically correct SQLite query.\n");
    prompt.push_str("- If the user's question is a greeting, a question that cannot be answered from the schema (e.g., \"what's the weather?\"), or is otherwise conversational, set \"type\" to \"text\" and \"content\" to a friendly, helpful message.\n\n");

    prompt.push_str("Examples:\n");
    prompt.push_str(r#"User: "hi" -> {"type": "text", "content": "Hello! How can I help you analyze your invoices today?"}"#);
    prompt.push('\n');
    prompt.push_str(r#"User: "top 5 vendors by spend" -> {"type": "sql", "content": "SELECT vendor_name, SUM(amount) as total_spend FROM invoices GROUP BY vendor_name ORDER BY total_spend DESC LIMIT 5;"}"#);
    prompt.push('\n');
    prompt.push_str(&format!(
        r#"User: "total spend last month" -> {{"type": "sql", "content": "SELECT SUM(amount) FROM invoices WHERE processed_date >= '{}';"}}"#,
        month_ago
    ));
    prompt.push('\n');

    prompt
}
