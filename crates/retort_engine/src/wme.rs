//! Working memory elements.

use std::fmt;

use retort_foundation::Value;

use crate::condition::Field;

/// An atomic fact: an `(identifier, attribute, value)` triple.
///
/// WMEs are immutable. The network keeps its own bookkeeping for each live
/// WME (which alpha memories and tokens reference it) keyed by the triple.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Wme {
    /// The identifier field, usually a fact reference.
    pub identifier: Value,
    /// The attribute field.
    pub attribute: Value,
    /// The value field.
    pub value: Value,
}

impl Wme {
    /// Creates a new WME.
    #[must_use]
    pub fn new(
        identifier: impl Into<Value>,
        attribute: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Returns the value stored in one field.
    #[must_use]
    pub fn get(&self, field: Field) -> &Value {
        match field {
            Field::Identifier => &self.identifier,
            Field::Attribute => &self.attribute,
            Field::Value => &self.value,
        }
    }
}

impl fmt::Debug for Wme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?}, {:?}, {:?})",
            self.identifier, self.attribute, self.value
        )
    }
}

impl fmt::Display for Wme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.identifier, self.attribute, self.value)
    }
}
