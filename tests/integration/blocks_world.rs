//! Blocks world integration tests
//!
//! A small planner that unstacks a tower onto the table through actions
//! that update facts.

use retort_engine::{
    Bindings, Condition, Fact, NetworkConfig, Production, ReteNetwork, SelectionStrategy,
    TracerConfig, var,
};
use retort_foundation::{Error, FactId, Value};

struct World {
    net: ReteNetwork,
    table: FactId,
}

/// Tower A on B on C on the table.
fn tower(config: NetworkConfig) -> World {
    let mut net = ReteNetwork::with_config(config);
    let table = net.add_fact(&mut Fact::new().with("isa", "table")).unwrap();
    let c = net
        .add_fact(&mut Fact::new().with("isa", "block").with("name", "C").with("on", table))
        .unwrap();
    let b = net
        .add_fact(&mut Fact::new().with("isa", "block").with("name", "B").with("on", c))
        .unwrap();
    net.add_fact(&mut Fact::new().with("isa", "block").with("name", "A").with("on", b))
        .unwrap();
    World { net, table }
}

/// Moves a clear block that sits on another block onto the table.
fn unstack(table: FactId) -> Production {
    Production::new("unstack")
        .when(vec![
            Condition::pos(var("b"), "isa", "block"),
            Condition::pos(var("b"), "on", var("under")),
            Condition::pos(var("under"), "isa", "block"),
            Condition::neg(var("above"), "on", var("b")),
        ])
        .with_action(move |net: &mut ReteNetwork, bindings: &Bindings| {
            let id = bindings
                .get_fact("b")
                .ok_or_else(|| Error::callback("?b is not a fact"))?;
            let mut fact = net
                .fact(id)
                .cloned()
                .ok_or_else(|| Error::callback("block vanished"))?;
            fact.set("on", table);
            net.update_fact(&mut fact)?;
            Ok(())
        })
}

fn on_table() -> Production {
    Production::new("on-table").when(vec![
        Condition::pos(var("b"), "isa", "block"),
        Condition::pos(var("b"), "on", var("t")),
        Condition::pos(var("t"), "isa", "table"),
    ])
}

fn names_on_table(net: &ReteNetwork) -> Vec<String> {
    let p = net.production_id("on-table").unwrap();
    let mut names: Vec<String> = net
        .matches()
        .iter()
        .filter(|m| m.production == p)
        .filter_map(|m| {
            let b = net.bindings(m).ok()?.get_fact("b")?;
            net.fact(b)?.get_value(&Value::from("name")).map(ToString::to_string)
        })
        .collect();
    names.sort();
    names
}

#[test]
fn only_the_top_block_can_move_first() {
    let World { mut net, table } = tower(NetworkConfig::new());
    let p = net.add_production(unstack(table)).unwrap();

    let ready: Vec<_> = net.matches().into_iter().filter(|m| m.production == p).collect();
    assert_eq!(ready.len(), 1);
    let b = net.bindings(&ready[0]).unwrap().get_fact("b").unwrap();
    assert_eq!(
        net.fact(b).unwrap().get_value(&Value::from("name")),
        Some(&Value::from("A"))
    );
}

#[test]
fn run_unstacks_the_whole_tower() {
    let World { mut net, table } = tower(
        NetworkConfig::new()
            .with_selection(SelectionStrategy::First),
    );
    net.add_production(unstack(table)).unwrap();
    net.add_production(on_table()).unwrap();
    assert_eq!(names_on_table(&net), vec!["C"]);

    assert_eq!(net.run(2).unwrap(), 2);
    assert_eq!(names_on_table(&net), vec!["A", "B", "C"]);

    let unstack_id = net.production_id("unstack").unwrap();
    assert!(net.matches().iter().all(|m| m.production != unstack_id));
    assert_eq!(net.facts().count(), 4);
}

#[test]
fn tracing_follows_the_run() {
    let World { mut net, table } = tower(
        NetworkConfig::new()
            .with_selection(SelectionStrategy::First)
            .with_tracer(TracerConfig::new().enabled().json()),
    );
    net.add_production(unstack(table)).unwrap();
    net.run(2).unwrap();

    let buffer = net.tracer().buffer();
    assert_eq!(buffer.by_event_type("match-fired").len(), 2);
    assert_eq!(buffer.by_event_type("fact-removed").len(), 2);
    assert_eq!(buffer.by_event_type("fact-added").len(), 6);

    let fired = buffer.by_event_type("match-fired");
    let json = net.tracer().format_records(&fired);
    assert!(json.contains("match-fired"));
}

#[test]
fn removing_the_rule_mid_way_stops_the_plan() {
    let World { mut net, table } = tower(NetworkConfig::new().with_selection(SelectionStrategy::First));
    let p = net.add_production(unstack(table)).unwrap();
    net.add_production(on_table()).unwrap();

    assert_eq!(net.run(1).unwrap(), 1);
    net.remove_production(p).unwrap();
    assert!(net.matches().iter().all(|m| m.production != p));
    assert_eq!(names_on_table(&net), vec!["A", "C"]);
}
