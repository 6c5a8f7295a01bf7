//! Facts: keyed records that decompose into WMEs.

use std::fmt;

use retort_foundation::{FactId, PersistentMap, Value};

use crate::wme::Wme;

/// A field value: either a plain value or another fact.
#[derive(Clone, Debug, PartialEq)]
pub enum FactValue {
    /// A plain value.
    Value(Value),
    /// A nested fact. It is registered before its parent and referenced by id.
    Nested(Fact),
}

impl FactValue {
    /// The value stored in a WME for this field.
    ///
    /// Nested facts become a reference to their id, or `nil` while they have
    /// none.
    #[must_use]
    pub fn as_wme_value(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Nested(f) => f.id().map_or(Value::Nil, Value::FactRef),
        }
    }
}

impl From<Value> for FactValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Fact> for FactValue {
    fn from(f: Fact) -> Self {
        Self::Nested(f)
    }
}

/// A record of `key → value` fields.
///
/// A fact has no id until it is added to a network. Adding it assigns a
/// fresh [`FactId`] and inserts one WME `(f-N, key, value)` per field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fact {
    id: Option<FactId>,
    fields: PersistentMap<Value, FactValue>,
}

impl Fact {
    /// Creates an empty fact.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fact whose keys are the positions `0, 1, 2, ...`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .enumerate()
            .fold(Self::new(), |fact, (i, v)| fact.with(i as i64, v))
    }

    /// Builder: sets a plain field.
    #[must_use]
    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder: sets a nested fact field.
    #[must_use]
    pub fn with_fact(mut self, key: impl Into<Value>, fact: Fact) -> Self {
        self.fields.insert(key.into(), FactValue::Nested(fact));
        self
    }

    /// Sets a plain field.
    pub fn set(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.fields.insert(key.into(), FactValue::Value(value.into()));
    }

    /// Removes a field.
    pub fn unset(&mut self, key: &Value) {
        self.fields.remove(key);
    }

    /// Returns the id, if the fact has been added to a network.
    #[must_use]
    pub fn id(&self) -> Option<FactId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: Option<FactId>) {
        self.id = id;
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&FactValue> {
        self.fields.get(key)
    }

    /// Returns a plain field's value.
    #[must_use]
    pub fn get_value(&self, key: &Value) -> Option<&Value> {
        match self.fields.get(key)? {
            FactValue::Value(v) => Some(v),
            FactValue::Nested(_) => None,
        }
    }

    /// Iterates fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&Value, &FactValue)> {
        self.fields.iter()
    }

    pub(crate) fn nested_facts(&self) -> Vec<(Value, Fact)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| match v {
                FactValue::Nested(f) => Some((k.clone(), f.clone())),
                FactValue::Value(_) => None,
            })
            .collect()
    }

    pub(crate) fn replace_nested(&mut self, key: Value, fact: Fact) {
        self.fields.insert(key, FactValue::Nested(fact));
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the fact has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decomposes the fact into WMEs. Empty until the fact has an id.
    #[must_use]
    pub fn wmes(&self) -> Vec<Wme> {
        let Some(id) = self.id else {
            return Vec::new();
        };
        self.fields
            .iter()
            .map(|(k, v)| Wme::new(Value::FactRef(id), k.clone(), v.as_wme_value()))
            .collect()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {}", v.as_wme_value())?;
        }
        write!(f, "}}")
    }
}
