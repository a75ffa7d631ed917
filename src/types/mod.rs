//! Shared types for Herald

pub mod error;

pub use error::{HeraldError, Result};
