//! Cross-layer integration tests for Retort
//!
//! Tests that drive the network end to end through facts, rules, and runs.

mod blocks_world;
mod scenarios;
