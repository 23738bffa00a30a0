//! Analytics over the invoice collection.

pub mod aggregator;

pub use aggregator::*;
