//! Multi-currency conversion and revaluation.

pub mod error;
pub mod exchange;
pub mod service;

pub use error::CurrencyError;
pub use exchange::{effective_rate, Currency, ExchangeRate};
pub use service::CurrencyService;
