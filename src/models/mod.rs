//! Core data models for schedule conversion.

mod cell;
mod record;
mod row;
mod time_range;

pub use cell::*;
pub use record::*;
pub use row::*;
pub use time_range::*;
