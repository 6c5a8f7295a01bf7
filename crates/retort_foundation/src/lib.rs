//! Core values, identifiers, errors, and persistent collections for Retort.
//!
//! This crate provides:
//! - [`Value`] - The field type of every working memory element
//! - [`FactId`] and [`ProductionId`] - Per-network identifiers
//! - [`Error`] - Error kinds raised by network operations
//! - [`PersistentMap`] - Ordered map with O(1) clone, for fact fields and bindings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod id;
pub mod value;

pub use collections::PersistentMap;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use id::{FactId, ProductionId};
pub use value::{Value, ValueKind};
