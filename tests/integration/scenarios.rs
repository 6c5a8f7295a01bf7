//! End-to-end scenarios through the `retort` facade

use retort::engine::{Condition, Fact, Pattern, Production, ReteNetwork, Wme, var};
use retort::foundation::Value;

#[test]
fn blocks_on_blocks() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("on").when(vec![Condition::pos(var("x"), "on", var("y"))]))
        .unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    net.add_wme(Wme::new("b1", "on", "b3")).unwrap();
    assert_eq!(net.matches().len(), 2);

    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    let matches = net.matches();
    assert_eq!(matches.len(), 1);
    let b = net.bindings(&matches[0]).unwrap();
    assert_eq!(b.get("x"), Some(&Value::from("b1")));
    assert_eq!(b.get("y"), Some(&Value::from("b3")));
}

#[test]
fn block_not_on_anything() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("loose").when(vec![
        Condition::pos(var("x"), "isa", "block"),
        Condition::neg(var("x"), "on", var("y")),
    ]))
    .unwrap();

    net.add_wme(Wme::new("b1", "isa", "block")).unwrap();
    assert_eq!(net.matches().len(), 1);
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    assert_eq!(net.matches().len(), 0);
    net.remove_wme(&Wme::new("b1", "on", "b2")).unwrap();
    assert_eq!(net.matches().len(), 1);
}

#[test]
fn fact_retraction_and_readdition_round_trip() {
    let mut net = ReteNetwork::new();
    net.add_production(Production::new("pair").when(vec![
        Condition::pos(var("a"), "next", var("b")),
        Condition::pos(var("b"), "kind", var("k")),
    ]))
    .unwrap();

    let mut target = Fact::new().with("kind", "goal");
    let goal = net.add_fact(&mut target).unwrap();
    net.add_fact(&mut Fact::new().with("next", goal)).unwrap();
    assert_eq!(net.matches().len(), 1);

    let mut removed = net.remove_fact(goal).unwrap();
    assert!(net.matches().is_empty());
    let readded = net.add_fact(&mut removed).unwrap();
    assert_ne!(readded, goal);
    // The referencing fact still points at the old id.
    assert!(net.matches().is_empty());
    net.add_fact(&mut Fact::new().with("next", readded)).unwrap();
    assert_eq!(net.matches().len(), 1);
}

#[test]
fn cascade_cleanup_after_all_productions_leave() {
    let mut net = ReteNetwork::new();
    let on = Pattern::new(var("x"), "on", var("y"));
    let a = net
        .add_production(Production::new("a").when(vec![Condition::Positive(on.clone())]))
        .unwrap();
    let b = net
        .add_production(Production::new("b").when(vec![
            Condition::Positive(on.clone()),
            Condition::neg(var("y"), "on", var("x")),
        ]))
        .unwrap();
    net.add_wme(Wme::new("b1", "on", "b2")).unwrap();
    assert_eq!(net.matches().len(), 2);

    net.remove_production(a).unwrap();
    assert!(net.alpha_memory(&on).is_some());
    net.remove_production(b).unwrap();
    assert!(net.alpha_memory(&on).is_none());
    assert_eq!(net.wme_count(), 1);
}
