//! Integration tests for fact decomposition
//!
//! Tests add, remove, and update of structured facts and their WMEs.

use retort_engine::{Condition, Fact, Production, ReteNetwork, Wme, var};
use retort_foundation::{ErrorKind, Value};

fn colored_block() -> Production {
    Production::new("colored").when(vec![
        Condition::pos(var("b"), "isa", "block"),
        Condition::pos(var("b"), "color", var("c")),
    ])
}

#[test]
fn fact_decomposes_into_wmes() {
    let mut net = ReteNetwork::new();
    let mut fact = Fact::new().with("isa", "block").with("color", "red");
    let id = net.add_fact(&mut fact).unwrap();

    assert_eq!(fact.id(), Some(id));
    assert!(net.contains_wme(&Wme::new(id, "isa", "block")));
    assert!(net.contains_wme(&Wme::new(id, "color", "red")));
    assert_eq!(net.wme_count(), 2);
}

#[test]
fn facts_bind_their_ids() {
    let mut net = ReteNetwork::new();
    net.add_production(colored_block()).unwrap();
    let id = net
        .add_fact(&mut Fact::new().with("isa", "block").with("color", "red"))
        .unwrap();

    let m = net.matches()[0];
    let b = net.bindings(&m).unwrap();
    assert_eq!(b.get_fact("b"), Some(id));
    assert_eq!(b.get_str("c"), Some("red"));
}

#[test]
fn nested_facts_become_references() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("on-table").when(vec![
        Condition::pos(var("x"), "on", var("y")),
        Condition::pos(var("y"), "isa", "table"),
    ]))
    .unwrap();

    let mut block = Fact::new()
        .with("isa", "block")
        .with_fact("on", Fact::new().with("isa", "table"));
    let outer = net.add_fact(&mut block).unwrap();

    let m = net.matches()[0];
    let b = net.bindings(&m).unwrap();
    assert_eq!(b.get_fact("x"), Some(outer));
    let table = b.get_fact("y").unwrap();
    assert_ne!(table, outer);
    assert!(net.fact(table).is_some());
}

#[test]
fn removing_a_fact_retracts_its_matches() {
    let mut net = ReteNetwork::new();
    net.add_production(colored_block()).unwrap();
    let red = net
        .add_fact(&mut Fact::new().with("isa", "block").with("color", "red"))
        .unwrap();
    net.add_fact(&mut Fact::new().with("isa", "block").with("color", "blue"))
        .unwrap();
    assert_eq!(net.matches().len(), 2);

    let removed = net.remove_fact(red).unwrap();
    assert_eq!(removed.id(), None);
    assert_eq!(net.matches().len(), 1);
    assert!(net.wmes().all(|w| w.identifier != Value::FactRef(red)));
    for m in net.matches() {
        assert!(net
            .match_wmes(&m)
            .unwrap()
            .iter()
            .all(|w| w.identifier != Value::FactRef(red)));
    }
}

#[test]
fn readding_a_removed_fact_restores_its_match() {
    let mut net = ReteNetwork::new();
    net.add_production(colored_block()).unwrap();
    let id = net
        .add_fact(&mut Fact::new().with("isa", "block").with("color", "red"))
        .unwrap();

    let mut fact = net.remove_fact(id).unwrap();
    assert!(net.matches().is_empty());

    let again = net.add_fact(&mut fact).unwrap();
    assert_ne!(again, id);
    let m = net.matches()[0];
    assert_eq!(net.bindings(&m).unwrap().get_fact("b"), Some(again));
}

#[test]
fn removing_an_outer_fact_keeps_the_nested_one() {
    let mut net = ReteNetwork::new();
    let mut block = Fact::new().with_fact("on", Fact::new().with("isa", "table"));
    let outer = net.add_fact(&mut block).unwrap();
    net.remove_fact(outer).unwrap();
    assert_eq!(net.facts().count(), 1);
    assert_eq!(net.wme_count(), 1);
}

#[test]
fn update_moves_the_match() {
    let mut net = ReteNetwork::new();
    net.add_production(
        Production::new("red").when(vec![Condition::pos(var("b"), "color", "red")]),
    )
    .unwrap();
    let mut fact = Fact::new().with("color", "blue");
    net.add_fact(&mut fact).unwrap();
    assert!(net.matches().is_empty());

    fact.set("color", "red");
    let id = net.update_fact(&mut fact).unwrap();
    let m = net.matches()[0];
    assert_eq!(net.bindings(&m).unwrap().get_fact("b"), Some(id));
    assert_eq!(net.facts().count(), 1);
}

#[test]
fn positional_facts_use_integer_keys() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("stack").when(vec![
        Condition::pos(var("f"), 0_i64, var("x")),
        Condition::pos(var("f"), 1_i64, "on"),
    ]))
    .unwrap();
    net.add_fact(&mut Fact::positional(["b1", "on", "b2"]))
        .unwrap();
    net.add_fact(&mut Fact::positional(["b3", "under", "b2"]))
        .unwrap();
    let m = net.matches();
    assert_eq!(m.len(), 1);
    assert_eq!(net.bindings(&m[0]).unwrap().get_str("x"), Some("b1"));
}

#[test]
fn adding_a_registered_fact_fails_without_changes() {
    let mut net = ReteNetwork::new();
    let mut fact = Fact::new().with("isa", "block");
    net.add_fact(&mut fact).unwrap();
    let before = net.wme_count();

    let err = net.add_fact(&mut fact).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateIdentifier(_)));
    assert_eq!(net.wme_count(), before);
    assert_eq!(net.facts().count(), 1);
}

#[test]
fn network_display_lists_facts() {
    let mut net = ReteNetwork::new();
    net.add_fact(&mut Fact::new().with("isa", "block")).unwrap();
    let text = net.to_string();
    assert!(text.contains("Facts:\n  f-0 {isa: block}"));
    assert!(text.contains("(f-0 isa block)"));
}
