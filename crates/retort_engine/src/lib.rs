//! Incremental Rete network for Retort.
//!
//! This crate provides:
//! - [`ReteNetwork`] - Alpha/beta memories, joins, negation, and productions
//! - [`Condition`] and [`Production`] - Rule conditions and actions
//! - [`Fact`] and [`Wme`] - Working memory input
//! - [`MatchSelector`] - Pluggable conflict resolution for `run`
//! - [`Tracer`] - Structured event tracing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agenda;
pub mod bindings;
pub mod condition;
pub mod config;
pub mod fact;
pub mod network;
pub mod trace;
pub mod wme;

pub use agenda::{
    FirstSelector, Match, MatchSelector, RandomSelector, SalienceSelector, SelectionStrategy,
};
pub use bindings::Bindings;
pub use condition::{
    ActionFn, BindFn, BindSpec, Condition, Field, FilterFn, FilterSpec, Pattern, Production,
    Term, Var, var,
};
pub use config::NetworkConfig;
pub use fact::{Fact, FactValue};
pub use network::{AlphaKey, AlphaMemoryId, JoinTest, NodeId, NodeType, ReteNetwork, TokenId};
pub use trace::{
    HumanFormatter, JsonFormatter, TraceBuffer, TraceEvent, TraceFormat, TraceFormatter,
    TraceOutput, TraceRecord, Tracer, TracerConfig,
};
pub use wme::Wme;
