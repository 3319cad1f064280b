//! Shared types and configuration for Keystone.
//!
//! This crate provides common types used across all other crates:
//! - Money type with exact decimal precision and fixed scale
//! - Typed IDs for type-safe entity references
//! - Configuration management

pub mod config;
pub mod types;

pub use config::CoreConfig;
pub use types::{Money, MoneyError};
