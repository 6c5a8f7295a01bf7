//! Retort: incremental Rete pattern matcher
//!
//! This crate re-exports all layers of the Retort system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: retort_engine      - Rete network, conditions, facts, agenda, tracing
//! Layer 0: retort_foundation  - Core types (Value, FactId, Error, PersistentMap)
//! ```

pub use retort_engine as engine;
pub use retort_foundation as foundation;
