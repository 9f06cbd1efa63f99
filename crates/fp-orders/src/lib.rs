//! fp-orders
//!
//! Storefront business rules:
//! - Per-page pricing and production cost
//! - Page range selection
//! - Order creation validation and quoting
//! - Order number generation
//! - Status / payment update planning (admin and customer paths)
//! - Delivery address snapshots and profile forms
//! - UPI payment links
//!
//! Deterministic, pure logic. No IO, no database.

mod address;
mod number;
mod pages;
mod payment;
mod pricing;
mod update;

pub use address::*;
pub use number::{format_order_number, generate_order_number};
pub use pages::{page_spans, parse_page_range, printed_pages};
pub use payment::{format_amount, format_inr, parse_rupees, upi_payment_link, AmountError};
pub use pricing::*;
pub use update::*;
