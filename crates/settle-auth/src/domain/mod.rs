//! # Domain Layer
//!
//! Wire format, configuration, errors and the per-request outcome.

pub mod config;
pub mod error;
pub mod headers;
pub mod outcome;
