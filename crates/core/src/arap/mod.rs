//! Accounts receivable / accounts payable engine.
//!
//! Invoices, payments, payment applications, and aging reports.

pub mod aging;
pub mod error;
pub mod service;
pub mod types;

pub use aging::{generate_aging_report, standard_buckets, AgingBucket, AgingReport};
pub use error::ArapError;
pub use service::{ArapService, CreateInvoiceInput};
pub use types::{
    Counterparty, CounterpartyKind, Invoice, InvoiceLine, InvoiceStatus, Payment,
    PaymentApplication, PaymentMethod,
};
