//! Integration tests for Layer 1: Engine
//!
//! Tests for joins, negation, NCCs, node sharing, facts, and the agenda.

mod facts;
mod joins;
mod negation;

use retort_engine::ReteNetwork;

/// Every current match as sorted `(variable, value)` rows.
pub fn match_rows(net: &ReteNetwork, vars: &[&str]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = net
        .matches()
        .iter()
        .map(|m| {
            let b = net.bindings(m).unwrap();
            vars.iter()
                .map(|v| b.get(v).map_or_else(|| "-".to_string(), ToString::to_string))
                .collect()
        })
        .collect();
    rows.sort();
    rows
}

/// Builds expected rows from string slices.
pub fn rows(expected: &[&[&str]]) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = expected
        .iter()
        .map(|r| r.iter().map(ToString::to_string).collect())
        .collect();
    out.sort();
    out
}
