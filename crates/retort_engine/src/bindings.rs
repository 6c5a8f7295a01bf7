//! Variable bindings resolved from a partial match.

use std::fmt;

use retort_foundation::{FactId, PersistentMap, Value};

use crate::condition::Var;

/// Variable → value map handed to bind, filter, and action callbacks.
///
/// Built from a token chain. The map is persistent, so cloning a binding set
/// for a nested callback is cheap.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    vars: PersistentMap<Var, Value>,
}

impl Bindings {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a binding set with one more variable. An existing binding of
    /// the same variable is kept.
    #[must_use]
    pub fn with(&self, var: Var, value: Value) -> Self {
        if self.vars.contains_key(&var) {
            return self.clone();
        }
        Self {
            vars: self.vars.update(var, value),
        }
    }

    /// Inserts a binding in place, keeping an existing one.
    pub fn bind(&mut self, var: Var, value: Value) {
        if !self.vars.contains_key(&var) {
            self.vars.insert(var, value);
        }
    }

    /// Looks a variable up by name (with or without `?`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(&Var::new(name))
    }

    /// Looks a variable up.
    #[must_use]
    pub fn get_var(&self, var: &Var) -> Option<&Value> {
        self.vars.get(var)
    }

    /// Returns the variable as an integer, if bound to one.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Returns the variable as a string slice, if bound to one.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns the variable as a fact reference, if bound to one.
    #[must_use]
    pub fn get_fact(&self, name: &str) -> Option<FactId> {
        self.get(name).and_then(Value::as_fact)
    }

    /// Returns true if the variable is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates bindings in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Var, &Value)> {
        self.vars.iter()
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.vars.iter()).finish()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(Var, Value)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Var, Value)>>(iter: T) -> Self {
        let mut b = Self::new();
        for (var, value) in iter {
            b.bind(var, value);
        }
        b
    }
}
