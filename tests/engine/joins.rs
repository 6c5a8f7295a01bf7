//! Integration tests for positive conditions
//!
//! Tests alpha filtering, join tests, retroactive seeding, and retraction.

use retort_engine::{Condition, Production, ReteNetwork, Wme, var};

use crate::{match_rows, rows};

fn on_rule() -> Production {
    Production::new("on").when(vec![Condition::pos(var("x"), "on", var("y"))])
}

fn on_red_rule() -> Production {
    Production::new("on-red").when(vec![
        Condition::pos(var("x"), "on", var("y")),
        Condition::pos(var("y"), "color", "red"),
    ])
}

// =============================================================================
// Single Condition
// =============================================================================

#[test]
fn two_wmes_two_activations_then_one() {
    let mut net = ReteNetwork::new();
    net.add_production(on_rule()).unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b1", "on", "b3")).unwrap();
    assert_eq!(net.matches().len(), 2);

    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    let matches = net.matches();
    assert_eq!(matches.len(), 1);
    let b = net.bindings(&matches[0]).unwrap();
    assert_eq!(b.get_str("x"), Some("b1"));
    assert_eq!(b.get_str("y"), Some("b3"));
}

#[test]
fn constants_filter_in_the_alpha_network() {
    let mut net = ReteNetwork::new();
    net.add_production(
        Production::new("red").when(vec![Condition::pos(var("x"), "color", "red")]),
    )
    .unwrap();
    net.add_wme(Wme::new("b1", "color", "red")).unwrap();
    net.add_wme(Wme::new("b2", "color", "blue")).unwrap();
    net.add_wme(Wme::new("b3", "size", "red")).unwrap();
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["b1"]]));
}

#[test]
fn repeated_variable_in_one_pattern() {
    let mut net = ReteNetwork::new();
    net.add_production(
        Production::new("self").when(vec![Condition::pos(var("x"), "likes", var("x"))]),
    )
    .unwrap();
    net.add_wme(Wme::new("a", "likes", "a")).unwrap();
    net.add_wme(Wme::new("a", "likes", "b")).unwrap();
    assert_eq!(match_rows(&net, &["x"]), rows(&[&["a"]]));
}

// =============================================================================
// Joins
// =============================================================================

#[test]
fn join_on_shared_variable() {
    let mut net = ReteNetwork::new();
    net.add_production(on_red_rule()).unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b2", "color", "red")).unwrap();
    net.add_wme(Wme::new("b3", "on", "b4")).unwrap();
    net.add_wme(Wme::new("b4", "color", "blue")).unwrap();
    assert_eq!(match_rows(&net, &["x", "y"]), rows(&[&["b1", "b2"]]));
}

#[test]
fn join_order_of_arrival_does_not_matter() {
    let wmes = [
        Wme::new("b2", "color", "red"),
        Wme::new("b1", "on", "b2"),
        Wme::new("b3", "on", "b2"),
    ];

    let mut forward = ReteNetwork::new();
    forward.add_production(on_red_rule()).unwrap();
    for w in &wmes {
        forward.add_wme(w.clone()).unwrap();
    }

    let mut backward = ReteNetwork::new();
    backward.add_production(on_red_rule()).unwrap();
    for w in wmes.iter().rev() {
        backward.add_wme(w.clone()).unwrap();
    }

    assert_eq!(
        match_rows(&forward, &["x", "y"]),
        match_rows(&backward, &["x", "y"])
    );
    assert_eq!(forward.matches().len(), 2);
}

#[test]
fn three_level_chain() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("tower").when(vec![
        Condition::pos(var("a"), "on", var("b")),
        Condition::pos(var("b"), "on", var("c")),
        Condition::pos(var("c"), "on", "table"),
    ]))
    .unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b2", "on", "b3")).unwrap();
    net.add_wme(Wme::new("b3", "on", "table")).unwrap();
    net.add_wme(Wme::new("b4", "on", "b3")).unwrap();

    assert_eq!(match_rows(&net, &["a", "b", "c"]), rows(&[&["b1", "b2", "b3"]]));

    net.remove_wme(&Wme::new("b3", "on", "table")).unwrap();
    assert!(net.matches().is_empty());
}

#[test]
fn production_sees_earlier_wmes() {
    let mut net = ReteNetwork::new();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b2", "color", "red")).unwrap();
    net.add_production(on_red_rule()).unwrap();
    assert_eq!(match_rows(&net, &["x", "y"]), rows(&[&["b1", "b2"]]));
    assert_eq!(net.new_matches().len(), 1);
}

#[test]
fn match_wmes_list_the_chain() {
    let mut net = ReteNetwork::new();
    net.add_production(on_red_rule()).unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b2", "color", "red")).unwrap();
    let m = net.matches()[0];
    assert_eq!(
        net.match_wmes(&m).unwrap(),
        vec![Wme::new("b1", "on", "b2"), Wme::new("b2", "color", "red")]
    );
}

// =============================================================================
// Retraction
// =============================================================================

#[test]
fn retracting_everything_leaves_only_the_root_token() {
    let mut net = ReteNetwork::new();
    net.add_production(on_red_rule()).unwrap();
    let wmes = [
        Wme::new("b1", "on", "b2"),
        Wme::new("b2", "color", "red"),
        Wme::new("b3", "on", "b2"),
    ];
    for w in &wmes {
        net.add_wme(w.clone()).unwrap();
    }
    assert_eq!(net.matches().len(), 2);

    for w in &wmes {
        net.remove_wme(w).unwrap();
    }
    assert!(net.matches().is_empty());
    assert_eq!(net.token_count(), 1);
    assert_eq!(net.wme_count(), 0);
}

#[test]
fn retracting_a_wme_twice_fails() {
    let mut net = ReteNetwork::new();
    let w = Wme::new("b1", "on", "b2");
    net.add_wme(w.clone()).unwrap();
    net.remove_wme(&w).unwrap();
    let err = net.remove_wme(&w).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn retracted_matches_leave_new_matches() {
    let mut net = ReteNetwork::new();
    net.add_production(on_rule()).unwrap();
    let w = Wme::new("b1", "on", "b2");
    net.add_wme(w.clone()).unwrap();
    assert_eq!(net.new_matches().len(), 1);
    net.remove_wme(&w).unwrap();
    assert!(net.new_matches().is_empty());
}
