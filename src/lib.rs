//! # Schedule Sync
//!
//! Converts a class-schedule table into the JSON document read by the
//! department calendar.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (cells, rows, schedule records)
//! - **calculate**: Class duration from free-text time ranges
//! - **normalize**: Row normalization policies (local file vs. Google Sheets)
//! - **fetch**: Row sources (spreadsheet files, Google Sheets)
//! - **storage**: Schedule document output
//! - **ingest**: Source to document pipeline
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod storage;

pub use models::*;
