//! Integration tests for negated conditions
//!
//! Tests blocking, unblocking, join tests inside negations, and seeding.

use retort_engine::{Bindings, Condition, Fact, Production, ReteNetwork, Wme, var};
use retort_foundation::{Error, ErrorKind};

use crate::{match_rows, rows};

fn unstacked_rule() -> Production {
    Production::new("unstacked").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
    ])
}

fn clear_rule() -> Production {
    Production::new("clear").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("y"), "on", var("x")),
    ])
}

#[test]
fn negation_toggles_one_activation() {
    let mut net = ReteNetwork::new();
    net.add_production(unstacked_rule()).unwrap();

    net.add_wme(Wme::new("b1", "isa", "block")).unwrap();
    assert_eq!(net.matches().len(), 1);

    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    assert_eq!(net.matches().len(), 0);

    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    let matches = net.matches();
    assert_eq!(matches.len(), 1);
    assert_eq!(
        net.bindings(&matches[0]).unwrap().get_str("x"),
        Some("b1")
    );
}

#[test]
fn every_blocker_must_leave() {
    let mut net = ReteNetwork::new();
    net.add_production(unstacked_rule()).unwrap();
    net.add_wme(Wme::new("b1", "isa", "block")).unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b1", "on", "b3")).unwrap();

    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    assert!(net.matches().is_empty());

    net.remove_wme(&Wme::new("b1", "on", "b3")).unwrap();
    assert_eq!(net.matches().len(), 1);
}

#[test]
fn negation_joins_on_earlier_variables() {
    let mut net = ReteNetwork::new();
    net.add_production(clear_rule()).unwrap();
    for b in ["b1", "b2", "b3"] {
        net.add_wme(Wme::new(b, "isa", "block")).unwrap();
    }
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b2", "on", "b3")).unwrap();

    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"]]));

    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"], &["b2"]]));
}

#[test]
fn negation_seeded_from_existing_memory() {
    let mut net = ReteNetwork::new();
    for b in ["b1", "b2"] {
        net.add_wme(Wme::new(b, "isa", "block")).unwrap();
    }
    net.add_wme(Wme::new("b3", "on", "b1")).unwrap();

    net.add_production(clear_rule()).unwrap();
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b2"]]));
}

#[test]
fn leading_negation_matches_an_empty_memory() {
    let mut net = ReteNetwork::new();
    net.add_production(
        Production::new("empty-table").when(vec![Condition::neg(var("x"), "on", "table")]),
    )
    .unwrap();
    assert_eq!(net.matches().len(), 1);

    net.add_wme(Wme::new("b1", "on", "table")).unwrap();
    assert!(net.matches().is_empty());

    net.remove_wme(&Wme::new("b1", "on", "table")).unwrap();
    assert_eq!(net.matches().len(), 1);
}

#[test]
fn positive_after_negation() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("free-red").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
        Condition::pos(var("x"), "color", "red"),
    ]))
    .unwrap();
    net.add_wme(Wme::new("b1", "isa", "block")).unwrap();
    net.add_wme(Wme::new("b1", "color", "red")).unwrap();
    net.add_wme(Wme::new("b2", "isa", "block")).unwrap();
    net.add_wme(Wme::new("b2", "color", "red")).unwrap();
    net.add_wme(Wme::new("b2", "on", "b1")).unwrap();

    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"]]));

    net.remove_wme(&Wme::new("b2", "on", "b1")).unwrap();
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"], &["b2"]]));
}

#[test]
fn removing_the_positive_side_while_blocked() {
    let mut net = ReteNetwork::new();
    net.add_production(unstacked_rule()).unwrap();
    net.add_wme(Wme::new("b1", "isa", "block")).unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();

    net.remove_wme(&Wme::new("b1", "isa", "block")).unwrap();
    assert!(net.matches().is_empty());
    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    assert!(net.matches().is_empty());
    assert_eq!(net.token_count(), 1);
}

// =============================================================================
// Callback failures
// =============================================================================

/// Unstacked blocks, with a filter that fails for `b9`.
fn unstacked_except_b9() -> Production {
    Production::new("unstacked-except-b9").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
        Condition::filter("not-b9", |b: &Bindings| {
            if b.get_str("x") == Some("b9") {
                Err(Error::callback("boom"))
            } else {
                Ok(true)
            }
        }),
    ])
}

#[test]
fn failed_unblock_still_removes_the_wme() {
    let mut net = ReteNetwork::new();
    net.add_production(unstacked_except_b9()).unwrap();
    net.add_wme(Wme::new("b9", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b9", "isa", "block")).unwrap();

    let err = net.remove_wme(&Wme::new("b9", "on", "b2")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Callback(_)));
    assert!(!net.contains_wme(&Wme::new("b9", "on", "b2")));
    assert_eq!(net.wme_count(), 1);
    assert_eq!(
        net.wmes().cloned().collect::<Vec<_>>(),
        vec![Wme::new("b9", "isa", "block")]
    );

    net.add_wme(Wme::new("b9", "on", "b2")).unwrap();
    assert_eq!(net.wme_count(), 2);
    assert!(net.remove_wme(&Wme::new("b9", "on", "b2")).is_err());
    assert_eq!(net.wme_count(), 1);
    assert!(net.matches().is_empty());
}

#[test]
fn failed_unblock_does_not_stop_other_owners() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("free-except-b9").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg("door", "is", "locked"),
        Condition::filter("not-b9", |b: &Bindings| {
            if b.get_str("x") == Some("b9") {
                Err(Error::callback("boom"))
            } else {
                Ok(true)
            }
        }),
    ]))
    .unwrap();
    net.add_wme(Wme::new("door", "is", "locked")).unwrap();
    for b in ["b9", "b1"] {
        net.add_wme(Wme::new(b, "isa", "block")).unwrap();
    }
    assert!(net.matches().is_empty());

    assert!(net.remove_wme(&Wme::new("door", "is", "locked")).is_err());
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"]]));
    assert_eq!(net.wme_count(), 2);
}

#[test]
fn failed_fact_removal_still_unregisters_the_fact() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("never").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
        Condition::filter("fails", |_: &Bindings| Err(Error::callback("boom"))),
    ]))
    .unwrap();
    let id = net.add_fact(&mut Fact::new().with("on", "b2")).unwrap();
    net.add_wme(Wme::new(id, "isa", "block")).unwrap();

    let err = net.remove_fact(id).map(|_| ()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Callback(_)));
    assert!(net.fact(id).is_none());
    assert_eq!(net.wme_count(), 0);
    assert_eq!(net.token_count(), 1);
}

#[test]
fn failed_fact_addition_registers_every_wme() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("never").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
        Condition::filter("fails", |_: &Bindings| Err(Error::callback("boom"))),
    ]))
    .unwrap();

    let mut fact = Fact::new().with("isa", "block").with("on", "b2");
    let err = net.add_fact(&mut fact).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Callback(_)));
    let id = fact.id().unwrap();
    assert!(net.fact(id).is_some());
    assert_eq!(net.wme_count(), 2);

    net.remove_fact(id).unwrap();
    assert!(net.fact(id).is_none());
    assert_eq!(net.wme_count(), 0);
}
