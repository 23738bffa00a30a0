//! Mock invoice dataset.
//!
//! Generates a plausible spread of invoices across a fixed set of vendors
//! and categories, processed between the start of 2023 and today.

use crate::models::{Invoice, InvoiceStatus, Vendor};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

const VENDORS: [(&str, &str); 12] = [
    ("ven_1", "Office Supplies Inc."),
    ("ven_2", "Cloud Services LLC"),
    ("ven_3", "Marketing Agency Co."),
    ("ven_4", "Software Solutions"),
    ("ven_5", "Logistics Partner"),
    ("ven_6", "Consulting Group"),
    ("ven_7", "Hardware Universe"),
    ("ven_8", "Travel Experts"),
    ("ven_9", "Utilities Provider"),
    ("ven_10", "Catering Services"),
    ("ven_11", "Legal Advisors"),
    ("ven_12", "Maintenance Pros"),
];

const CATEGORIES: [&str; 11] = [
    "Office Supplies",
    "Software",
    "Marketing",
    "Utilities",
    "Travel",
    "Consulting",
    "Logistics",
    "Hardware",
    "Food & Beverage",
    "Legal",
    "Maintenance",
];

/// Days between processing and the due date.
const PAYMENT_TERMS_DAYS: i64 = 30;

/// Options for generating a mock dataset.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Number of invoices to generate.
    pub count: usize,
    /// RNG seed; `None` draws from system entropy.
    pub seed: Option<u64>,
    /// Latest possible processed date, also used to age pending invoices.
    pub today: NaiveDate,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            count: 200,
            seed: None,
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// Generate a mock invoice collection.
pub fn generate_mock_invoices(options: &MockOptions) -> Vec<Invoice> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(options.today);
    let span_days = (options.today - start).num_days().max(0);

    debug!(
        "Generating {} mock invoices between {} and {}",
        options.count, start, options.today
    );

    (1..=options.count)
        .map(|n| create_mock_invoice(&mut rng, n, start, span_days, options.today))
        .collect()
}

fn create_mock_invoice(
    rng: &mut StdRng,
    n: usize,
    start: NaiveDate,
    span_days: i64,
    today: NaiveDate,
) -> Invoice {
    let processed_date = start + Duration::days(rng.gen_range(0..=span_days));
    let due_date = processed_date + Duration::days(PAYMENT_TERMS_DAYS);

    let mut status = *InvoiceStatus::ALL
        .choose(rng)
        .unwrap_or(&InvoiceStatus::Pending);
    if status == InvoiceStatus::Pending && due_date < today {
        status = InvoiceStatus::NotPaid;
    }

    let (vendor_id, vendor_name) = *VENDORS.choose(rng).unwrap_or(&VENDORS[0]);
    let category = *CATEGORIES.choose(rng).unwrap_or(&CATEGORIES[0]);
    let amount = (rng.gen_range(100.0..5100.0_f64) * 100.0).round() / 100.0;

    Invoice {
        id: format!("inv_{}", n),
        invoice_number: format!("INV-{}", 20230000 + n),
        vendor: Vendor::new(vendor_id, vendor_name),
        amount,
        due_date,
        processed_date,
        category: category.to_string(),
        status,
    }
}
