//! Rule conditions and productions.
//!
//! This is the boundary to whatever authors rules: a production is a name,
//! one or more alternative condition lists, and an optional action. The
//! network compiles each condition list into alpha memories and beta nodes.

use std::fmt;
use std::sync::Arc;

use retort_foundation::{FactId, Result, Value};

use crate::bindings::Bindings;
use crate::network::{AlphaKey, ReteNetwork};
use crate::wme::Wme;

// =============================================================================
// Variables and Terms
// =============================================================================

/// A pattern variable such as `?x`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(Arc<str>);

impl Var {
    /// Creates a variable. A leading `?` is accepted and dropped.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.strip_prefix('?').unwrap_or(name).into())
    }

    /// Returns the variable name without the `?` prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Shorthand for [`Var::new`].
#[must_use]
pub fn var(name: &str) -> Var {
    Var::new(name)
}

/// One position of a pattern: a variable or a literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    /// Binds (or joins on) a variable.
    Var(Var),
    /// Must equal this literal.
    Const(Value),
}

impl Term {
    /// Returns the variable if this term is one.
    #[must_use]
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Var(v) => Some(v),
            Self::Const(_) => None,
        }
    }

    /// Returns the literal if this term is one.
    #[must_use]
    pub fn as_const(&self) -> Option<&Value> {
        match self {
            Self::Var(_) => None,
            Self::Const(c) => Some(c),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(v) => write!(f, "{v}"),
            Self::Const(c) => write!(f, "{c}"),
        }
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Self::Var(v)
    }
}

impl From<Value> for Term {
    fn from(v: Value) -> Self {
        Self::Const(v)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Self::Const(s.into())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Self::Const(s.into())
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Self::Const(n.into())
    }
}

impl From<i32> for Term {
    fn from(n: i32) -> Self {
        Self::Const(n.into())
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Self::Const(b.into())
    }
}

impl From<FactId> for Term {
    fn from(id: FactId) -> Self {
        Self::Const(id.into())
    }
}

/// The three positions of a WME.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// First position.
    Identifier,
    /// Second position.
    Attribute,
    /// Third position.
    Value,
}

impl Field {
    /// All fields in positional order.
    pub const ALL: [Field; 3] = [Field::Identifier, Field::Attribute, Field::Value];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Attribute => write!(f, "attribute"),
            Self::Value => write!(f, "value"),
        }
    }
}

// =============================================================================
// Pattern
// =============================================================================

/// A WME pattern: one term per field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    /// Identifier term.
    pub identifier: Term,
    /// Attribute term.
    pub attribute: Term,
    /// Value term.
    pub value: Term,
}

impl Pattern {
    /// Creates a pattern from three terms.
    #[must_use]
    pub fn new(
        identifier: impl Into<Term>,
        attribute: impl Into<Term>,
        value: impl Into<Term>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Returns the term at a field.
    #[must_use]
    pub fn term(&self, field: Field) -> &Term {
        match field {
            Field::Identifier => &self.identifier,
            Field::Attribute => &self.attribute,
            Field::Value => &self.value,
        }
    }

    /// The alpha memory key: literals stay, variables become wildcards.
    #[must_use]
    pub fn alpha_key(&self) -> AlphaKey {
        AlphaKey::new(
            self.identifier.as_const().cloned(),
            self.attribute.as_const().cloned(),
            self.value.as_const().cloned(),
        )
    }

    /// Iterates `(field, variable)` pairs in positional order.
    pub fn variables(&self) -> impl Iterator<Item = (Field, &Var)> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.term(field).as_var().map(|v| (field, v)))
    }

    /// Returns the first field holding `var`, if any.
    #[must_use]
    pub fn field_of(&self, var: &Var) -> Option<Field> {
        self.variables().find(|(_, v)| *v == var).map(|(f, _)| f)
    }

    /// Variable values taken from a WME matched by this pattern.
    #[must_use]
    pub fn bind(&self, wme: &Wme) -> Vec<(Var, Value)> {
        let mut out: Vec<(Var, Value)> = Vec::new();
        for (field, v) in self.variables() {
            if !out.iter().any(|(seen, _)| seen == v) {
                out.push((v.clone(), wme.get(field).clone()));
            }
        }
        out
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.identifier, self.attribute, self.value)
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Computes a new variable from the bindings so far.
pub type BindFn = Arc<dyn Fn(&Bindings) -> Result<Value>>;

/// Decides whether a partial match survives.
pub type FilterFn = Arc<dyn Fn(&Bindings) -> Result<bool>>;

/// Runs when a match fires. May add or remove facts.
pub type ActionFn = Arc<dyn Fn(&mut ReteNetwork, &Bindings) -> Result<()>>;

/// A bind condition: `var := func(bindings)`.
#[derive(Clone)]
pub struct BindSpec {
    /// Label used in traces and network dumps.
    pub name: String,
    /// Variable receiving the result.
    pub var: Var,
    /// The computation.
    pub func: BindFn,
}

impl PartialEq for BindSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.var == other.var
            && std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl fmt::Debug for BindSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bind({} := {})", self.var, self.name)
    }
}

/// A filter condition: the partial match survives while `func` holds.
#[derive(Clone)]
pub struct FilterSpec {
    /// Label used in traces and network dumps.
    pub name: String,
    /// The predicate.
    pub func: FilterFn,
}

impl PartialEq for FilterSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.name)
    }
}

// =============================================================================
// Condition
// =============================================================================

/// One element of a production's condition list.
#[derive(Clone, Debug)]
pub enum Condition {
    /// A WME matching the pattern must exist.
    Positive(Pattern),
    /// No WME matching the pattern may exist.
    Negative(Pattern),
    /// The conjunction of the nested conditions must have no match.
    Ncc(Vec<Condition>),
    /// Computes a new variable.
    Bind(BindSpec),
    /// Tests the bindings so far.
    Filter(FilterSpec),
}

impl Condition {
    /// Creates a positive condition.
    #[must_use]
    pub fn pos(
        identifier: impl Into<Term>,
        attribute: impl Into<Term>,
        value: impl Into<Term>,
    ) -> Self {
        Self::Positive(Pattern::new(identifier, attribute, value))
    }

    /// Creates a negated condition.
    #[must_use]
    pub fn neg(
        identifier: impl Into<Term>,
        attribute: impl Into<Term>,
        value: impl Into<Term>,
    ) -> Self {
        Self::Negative(Pattern::new(identifier, attribute, value))
    }

    /// Creates a negated conjunction.
    #[must_use]
    pub fn ncc(conditions: Vec<Condition>) -> Self {
        Self::Ncc(conditions)
    }

    /// Creates a bind condition.
    pub fn bind<F>(name: impl Into<String>, var: Var, func: F) -> Self
    where
        F: Fn(&Bindings) -> Result<Value> + 'static,
    {
        Self::Bind(BindSpec {
            name: name.into(),
            var,
            func: Arc::new(func),
        })
    }

    /// Creates a filter condition.
    pub fn filter<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Bindings) -> Result<bool> + 'static,
    {
        Self::Filter(FilterSpec {
            name: name.into(),
            func: Arc::new(func),
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive(p) => write!(f, "{p}"),
            Self::Negative(p) => write!(f, "(not {p})"),
            Self::Ncc(conds) => {
                write!(f, "(not")?;
                for c in conds {
                    write!(f, " {c}")?;
                }
                write!(f, ")")
            }
            Self::Bind(b) => write!(f, "(bind {} {})", b.var, b.name),
            Self::Filter(flt) => write!(f, "(test {})", flt.name),
        }
    }
}

// =============================================================================
// Production
// =============================================================================

/// A rule: alternative condition lists plus an optional action.
#[derive(Clone)]
pub struct Production {
    name: String,
    alternatives: Vec<Vec<Condition>>,
    salience: i32,
    action: Option<ActionFn>,
}

impl Production {
    /// Creates a production with no conditions yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternatives: Vec::new(),
            salience: 0,
            action: None,
        }
    }

    /// Adds one alternative condition list.
    ///
    /// A production with several alternatives matches when any of them does.
    #[must_use]
    pub fn when(mut self, conditions: Vec<Condition>) -> Self {
        self.alternatives.push(conditions);
        self
    }

    /// Sets the salience used by salience-ordered selection.
    #[must_use]
    pub fn with_salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Sets the action run when a match fires.
    #[must_use]
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ReteNetwork, &Bindings) -> Result<()> + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Returns the production name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the salience.
    #[must_use]
    pub fn salience(&self) -> i32 {
        self.salience
    }

    /// Returns the action, if any.
    #[must_use]
    pub fn action(&self) -> Option<&ActionFn> {
        self.action.as_ref()
    }

    /// Returns the condition lists as written.
    #[must_use]
    pub fn alternatives(&self) -> &[Vec<Condition>] {
        &self.alternatives
    }

    /// Returns the condition lists to compile.
    ///
    /// A production without any alternative compiles as one empty list, so
    /// it matches exactly once.
    #[must_use]
    pub fn condition_lists(&self) -> Vec<&[Condition]> {
        if self.alternatives.is_empty() {
            vec![&[][..]]
        } else {
            self.alternatives.iter().map(Vec::as_slice).collect()
        }
    }
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("name", &self.name)
            .field("alternatives", &self.alternatives)
            .field("salience", &self.salience)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            for c in alt {
                write!(f, " {c}")?;
            }
        }
        Ok(())
    }
}
