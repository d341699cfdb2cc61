//! Raw record ingestion for the psx enrichment pipeline.
//!
//! This crate handles:
//! - Structural validation of raw JSON mappings
//! - Ticker and date canonicalization
//! - OHLC consistency checks
//! - Per-record rejection reporting

pub mod validator;

pub use validator::{RecordValidator, RejectReason, ValidationStats};
