//! Core types and configuration for the psx enrichment pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Validated record types (clean and enriched)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{BatchLimits, FeatureToggles, TransformConfig, WindowConfig};
pub use error::{Error, Result};
pub use types::*;
