//! Data models for the spend dashboard.
//!
//! This module contains the invoice records supplied by the ledger, the
//! derived views produced by the aggregator, and the user profile kept by
//! the session store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A vendor that issues invoices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub name: String,
}

impl Vendor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "not paid")]
    NotPaid,
}

impl InvoiceStatus {
    /// All statuses, in the order the status selector offers them.
    pub const ALL: [InvoiceStatus; 3] = [
        InvoiceStatus::Paid,
        InvoiceStatus::Pending,
        InvoiceStatus::NotPaid,
    ];

    /// The stored label, as it appears in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::NotPaid => "not paid",
        }
    }

    /// Returns an emoji badge for the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "🟢",
            InvoiceStatus::Pending => "🟡",
            InvoiceStatus::NotPaid => "🔴",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Paid => write!(f, "Paid"),
            InvoiceStatus::Pending => write!(f, "Pending"),
            InvoiceStatus::NotPaid => write!(f, "Not paid"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "paid" => Ok(InvoiceStatus::Paid),
            "pending" => Ok(InvoiceStatus::Pending),
            "not paid" | "unpaid" => Ok(InvoiceStatus::NotPaid),
            other => Err(format!(
                "Unknown invoice status '{}' (expected paid, pending or not-paid)",
                other
            )),
        }
    }
}

/// A single billable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub vendor: Vendor,
    /// Invoice amount in dollars.
    pub amount: f64,
    pub due_date: NaiveDate,
    pub processed_date: NaiveDate,
    pub category: String,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Whether this invoice still contributes to upcoming cash outflow.
    pub fn is_outstanding(&self) -> bool {
        self.status != InvoiceStatus::Paid
    }
}

/// Headline statistics for the stat tiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_spend: f64,
    pub total_invoice_count: usize,
    /// Mirrors `total_invoice_count`; there is no separate upload tracking.
    pub documents_uploaded: usize,
    /// Zero when there are no invoices.
    pub average_invoice_value: f64,
}

/// One calendar month of processed invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// Short label such as `Jan 24`.
    pub month: String,
    pub value: f64,
    pub volume: usize,
    /// First day of the month; buckets are ordered by this date.
    pub date: NaiveDate,
}

/// Total spend for one vendor name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSpend {
    pub name: String,
    pub spend: f64,
}

/// Total spend for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub name: String,
    pub value: f64,
}

/// Unpaid amount due on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashOutflow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// All derived views for one snapshot of the invoice collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: Stats,
    pub invoice_trends: Vec<TrendBucket>,
    pub top_vendors: Vec<VendorSpend>,
    pub category_spend: Vec<CategorySpend>,
    pub cash_outflow: Vec<CashOutflow>,
}

/// A locally stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub mobile: String,
    pub profile_pic_url: String,
}

impl User {
    /// Whether this is the built-in guest profile.
    pub fn is_guest(&self) -> bool {
        self.id == "guest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_labels() {
        let json = serde_json::to_string(&InvoiceStatus::NotPaid).unwrap();
        assert_eq!(json, "\"not paid\"");

        let parsed: InvoiceStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, InvoiceStatus::Pending);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("paid".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Paid));
        assert_eq!("Not-Paid".parse::<InvoiceStatus>(), Ok(InvoiceStatus::NotPaid));
        assert_eq!("not_paid".parse::<InvoiceStatus>(), Ok(InvoiceStatus::NotPaid));
        assert!("overdue".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_invoice_dates_round_trip_as_iso() {
        let invoice = Invoice {
            id: "inv_1".to_string(),
            invoice_number: "INV-20230001".to_string(),
            vendor: Vendor::new("ven_1", "Office Supplies Inc."),
            amount: 120.5,
            due_date: NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
            processed_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            category: "Office Supplies".to_string(),
            status: InvoiceStatus::Pending,
        };

        let json = serde_json::to_string(&invoice).unwrap();
        assert!(json.contains("\"due_date\":\"2024-02-14\""));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(invoice.is_outstanding());
    }

    #[test]
    fn test_user_password_omitted_when_absent() {
        let user = User {
            id: "guest".to_string(),
            name: "Guest User".to_string(),
            email: "guest@spendai.com".to_string(),
            password: None,
            mobile: String::new(),
            profile_pic_url: String::new(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(user.is_guest());
    }
}
