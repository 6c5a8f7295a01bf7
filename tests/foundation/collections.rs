//! Persistent map behavior as facts and bindings use it.

use retort_foundation::{PersistentMap, Value};

fn fields() -> PersistentMap<Value, Value> {
    [
        (Value::from("size"), Value::Int(3)),
        (Value::from("color"), Value::from("red")),
        (Value::Int(0), Value::from("b1")),
    ]
    .into_iter()
    .collect()
}

#[test]
fn empty_map() {
    let m: PersistentMap<Value, Value> = PersistentMap::default();
    assert!(m.is_empty());
    assert_eq!(m.len(), 0);
    assert_eq!(m.iter().count(), 0);
}

#[test]
fn update_is_persistent() {
    let before = fields();
    let after = before.update(Value::from("color"), Value::from("blue"));
    assert_eq!(before.get(&Value::from("color")), Some(&Value::from("red")));
    assert_eq!(after.get(&Value::from("color")), Some(&Value::from("blue")));
    assert_eq!(after.len(), before.len());
}

#[test]
fn without_is_persistent() {
    let before = fields();
    let after = before.without(&Value::from("size"));
    assert!(before.contains_key(&Value::from("size")));
    assert!(!after.contains_key(&Value::from("size")));
    assert_ne!(before, after);
}

#[test]
fn keys_follow_value_order() {
    let keys: Vec<Value> = fields().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![Value::Int(0), Value::from("color"), Value::from("size")]
    );
}

#[test]
fn in_place_edits_do_not_leak_into_clones() {
    let mut m = fields();
    let copy = m.clone();
    m.insert(Value::from("size"), Value::Int(4));
    m.remove(&Value::Int(0));
    assert_eq!(copy, fields());
    assert_eq!(m.get(&Value::from("size")), Some(&Value::Int(4)));
    assert_eq!(m.len(), 2);
}
