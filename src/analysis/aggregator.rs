//! Invoice aggregation and statistics.
//!
//! Every view here is a pure function of the invoice slice: nothing is
//! cached between calls and the input is never mutated.

use crate::models::{
    CashOutflow, CategorySpend, Dashboard, Invoice, Stats, TrendBucket, VendorSpend,
};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Number of vendors kept in the ranking.
pub const TOP_VENDOR_LIMIT: usize = 10;

/// Number of distinct due dates kept in the outflow forecast.
pub const CASH_OUTFLOW_LIMIT: usize = 30;

/// Compute the headline statistics.
pub fn compute_stats(invoices: &[Invoice]) -> Stats {
    let total_spend: f64 = invoices.iter().map(|inv| inv.amount).sum();
    let count = invoices.len();

    let average_invoice_value = if count == 0 {
        0.0
    } else {
        total_spend / count as f64
    };

    Stats {
        total_spend,
        total_invoice_count: count,
        documents_uploaded: count,
        average_invoice_value,
    }
}

/// Bucket invoices by the calendar month they were processed in.
///
/// Buckets come back in chronological order of their month-start date,
/// so December of one year precedes January of the next.
pub fn compute_monthly_trend(invoices: &[Invoice]) -> Vec<TrendBucket> {
    let mut months: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for inv in invoices {
        let entry = months.entry(month_start(inv.processed_date)).or_default();
        entry.0 += inv.amount;
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(date, (value, volume))| TrendBucket {
            month: month_label(date),
            value,
            volume,
            date,
        })
        .collect()
}

/// Rank vendors by total spend, highest first, keeping the top ten.
///
/// Vendors are keyed by name, so two records sharing a name are merged.
/// Ties keep the order in which the vendors were first seen.
pub fn compute_vendor_ranking(invoices: &[Invoice]) -> Vec<VendorSpend> {
    let mut spend: IndexMap<&str, f64> = IndexMap::new();

    for inv in invoices {
        *spend.entry(inv.vendor.name.as_str()).or_default() += inv.amount;
    }

    let mut ranking: Vec<VendorSpend> = spend
        .into_iter()
        .map(|(name, spend)| VendorSpend {
            name: name.to_string(),
            spend,
        })
        .collect();

    // sort_by is stable
    ranking.sort_by(|a, b| {
        b.spend
            .partial_cmp(&a.spend)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranking.truncate(TOP_VENDOR_LIMIT);

    ranking
}

/// Total spend per category, in first-seen order.
pub fn compute_category_breakdown(invoices: &[Invoice]) -> Vec<CategorySpend> {
    let mut spend: IndexMap<&str, f64> = IndexMap::new();

    for inv in invoices {
        *spend.entry(inv.category.as_str()).or_default() += inv.amount;
    }

    spend
        .into_iter()
        .map(|(name, value)| CategorySpend {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// Forecast unpaid outflow by due date.
///
/// Paid invoices are dropped before grouping. The result covers the
/// nearest thirty distinct due dates, earliest first.
pub fn compute_cash_outflow(invoices: &[Invoice]) -> Vec<CashOutflow> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for inv in invoices.iter().filter(|inv| inv.is_outstanding()) {
        *by_date.entry(inv.due_date).or_default() += inv.amount;
    }

    by_date
        .into_iter()
        .take(CASH_OUTFLOW_LIMIT)
        .map(|(date, amount)| CashOutflow { date, amount })
        .collect()
}

/// Compute every dashboard view for the given invoices.
pub fn compute_dashboard(invoices: &[Invoice]) -> Dashboard {
    debug!("Aggregating {} invoices", invoices.len());

    Dashboard {
        stats: compute_stats(invoices),
        invoice_trends: compute_monthly_trend(invoices),
        top_vendors: compute_vendor_ranking(invoices),
        category_spend: compute_category_breakdown(invoices),
        cash_outflow: compute_cash_outflow(invoices),
    }
}

/// Total unpaid amount across all outstanding invoices.
pub fn outstanding_total(invoices: &[Invoice]) -> f64 {
    invoices
        .iter()
        .filter(|inv| inv.is_outstanding())
        .map(|inv| inv.amount)
        .sum()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b %y").to_string()
}
