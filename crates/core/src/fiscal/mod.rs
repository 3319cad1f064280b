//! Fiscal year and period management.

pub mod error;
pub mod period;
pub mod service;

pub use error::FiscalError;
pub use period::{FiscalPeriod, FiscalYear, PeriodStatus};
pub use service::{FiscalService, YearEndResult};
