//! Sorted, paginated invoice table.

use crate::models::Invoice;
use std::cmp::Ordering;

/// Column the invoice table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    InvoiceNumber,
    Vendor,
    Amount,
    DueDate,
    #[default]
    ProcessedDate,
    Category,
    Status,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Sorting applied to the table. Defaults to newest processed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// One page of the invoice table.
#[derive(Debug, Clone)]
pub struct InvoicePage<'a> {
    pub rows: Vec<&'a Invoice>,
    /// 1-indexed page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

/// Sort invoices and cut out one page.
///
/// The requested page is clamped into `1..=total_pages`.
pub fn paginate(
    invoices: &[Invoice],
    sort: SortConfig,
    page: usize,
    page_size: usize,
) -> InvoicePage<'_> {
    let page_size = page_size.max(1);
    let mut rows: Vec<&Invoice> = invoices.iter().collect();
    rows.sort_by(|a, b| {
        let ord = compare(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let rows = rows.into_iter().skip(start).take(page_size).collect();

    InvoicePage {
        rows,
        page,
        total_pages,
        total_rows,
    }
}

fn compare(a: &Invoice, b: &Invoice, key: SortKey) -> Ordering {
    match key {
        SortKey::InvoiceNumber => a.invoice_number.cmp(&b.invoice_number),
        SortKey::Vendor => a.vendor.name.cmp(&b.vendor.name),
        SortKey::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
        SortKey::DueDate => a.due_date.cmp(&b.due_date),
        SortKey::ProcessedDate => a.processed_date.cmp(&b.processed_date),
        SortKey::Category => a.category.cmp(&b.category),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}
