//! Multi-jurisdiction tax calculation.

pub mod error;
pub mod service;
pub mod types;

pub use error::TaxError;
pub use service::TaxService;
pub use types::{
    CalculationMethod, ProductType, TaxBracket, TaxCalculationResult, TaxDetail, TaxJurisdiction,
    TaxRate, TaxType,
};
