//! Beta network nodes.

use std::fmt;

use crate::condition::{BindSpec, Field, FilterSpec, Pattern, Var};
use retort_foundation::ProductionId;

use super::arena::{AlphaMemoryId, NodeId, TokenId};

// =============================================================================
// Join Tests
// =============================================================================

/// A consistency check between a candidate WME and a partial match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JoinTest {
    /// `wme[field]` equals `other` of the WME matched at token depth `depth`.
    Field {
        /// Field of the candidate WME.
        field: Field,
        /// Token depth of the earlier condition.
        depth: usize,
        /// Field of the earlier condition's WME.
        other: Field,
    },
    /// `wme[field]` equals `wme[other]` (a variable repeated in one pattern).
    Intra {
        /// Later occurrence.
        field: Field,
        /// First occurrence.
        other: Field,
    },
    /// `wme[field]` equals the value a bind condition gave `var`.
    Binding {
        /// Field of the candidate WME.
        field: Field,
        /// The bound variable.
        var: Var,
    },
}

impl fmt::Display for JoinTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field {
                field,
                depth,
                other,
            } => write!(f, "{field}=[{depth}].{other}"),
            Self::Intra { field, other } => write!(f, "{field}={other}"),
            Self::Binding { field, var } => write!(f, "{field}={var}"),
        }
    }
}

// =============================================================================
// Node Kinds
// =============================================================================

/// Public tag naming a node's kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The dummy root.
    Top,
    /// Stores tokens for the joins below it.
    BetaMemory,
    /// Joins tokens with an alpha memory.
    Join,
    /// Passes tokens that have no matching WME.
    Negative,
    /// Passes tokens whose subnetwork has no match.
    Ncc,
    /// Bottom of an NCC subnetwork.
    NccPartner,
    /// Adds a computed variable.
    Bind,
    /// Drops partial matches failing a predicate.
    Filter,
    /// Terminal node holding a production's activations.
    Production,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::BetaMemory => "beta-memory",
            Self::Join => "join",
            Self::Negative => "negative",
            Self::Ncc => "ncc",
            Self::NccPartner => "ncc-partner",
            Self::Bind => "bind",
            Self::Filter => "filter",
            Self::Production => "production",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug)]
pub(crate) struct JoinNode {
    pub(crate) amem: AlphaMemoryId,
    pub(crate) tests: Vec<JoinTest>,
    pub(crate) pattern: Pattern,
    /// Not in the parent's `children`.
    pub(crate) left_unlinked: bool,
    /// Not in the alpha memory's `successors`.
    pub(crate) right_unlinked: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct NegativeNode {
    pub(crate) amem: AlphaMemoryId,
    pub(crate) tests: Vec<JoinTest>,
    pub(crate) pattern: Pattern,
    pub(crate) items: Vec<TokenId>,
    pub(crate) right_unlinked: bool,
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Top,
    BetaMemory {
        items: Vec<TokenId>,
    },
    Join(JoinNode),
    Negative(NegativeNode),
    Ncc {
        items: Vec<TokenId>,
        partner: NodeId,
    },
    NccPartner {
        ncc: NodeId,
        /// Levels the subnetwork adds below the NCC's parent.
        conjuncts: usize,
        /// Results whose owner token does not exist yet.
        buffer: Vec<TokenId>,
        /// Every live result, buffered or owned.
        results: Vec<TokenId>,
    },
    Bind(BindSpec),
    Filter(FilterSpec),
    Production {
        production: ProductionId,
        items: Vec<TokenId>,
    },
}

impl NodeKind {
    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            Self::Top => NodeType::Top,
            Self::BetaMemory { .. } => NodeType::BetaMemory,
            Self::Join(_) => NodeType::Join,
            Self::Negative(_) => NodeType::Negative,
            Self::Ncc { .. } => NodeType::Ncc,
            Self::NccPartner { .. } => NodeType::NccPartner,
            Self::Bind(_) => NodeType::Bind,
            Self::Filter(_) => NodeType::Filter,
            Self::Production { .. } => NodeType::Production,
        }
    }
}

/// A beta network node.
#[derive(Clone, Debug)]
pub(crate) struct BetaNode {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    /// Children currently receiving left activations.
    pub(crate) children: Vec<NodeId>,
    /// Every child, linked or not.
    pub(crate) all_children: Vec<NodeId>,
}

impl BetaNode {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            all_children: Vec::new(),
        }
    }

    pub(crate) fn alpha_memory(&self) -> Option<AlphaMemoryId> {
        match &self.kind {
            NodeKind::Join(j) => Some(j.amem),
            NodeKind::Negative(n) => Some(n.amem),
            _ => None,
        }
    }

    pub(crate) fn right_unlinked(&self) -> bool {
        match &self.kind {
            NodeKind::Join(j) => j.right_unlinked,
            NodeKind::Negative(n) => n.right_unlinked,
            _ => false,
        }
    }

    /// Tokens stored at this node.
    pub(crate) fn items(&self) -> &[TokenId] {
        match &self.kind {
            NodeKind::BetaMemory { items }
            | NodeKind::Ncc { items, .. }
            | NodeKind::Production { items, .. }
            | NodeKind::Negative(NegativeNode { items, .. })
            | NodeKind::NccPartner { results: items, .. } => items,
            NodeKind::Top | NodeKind::Join(_) | NodeKind::Bind(_) | NodeKind::Filter(_) => &[],
        }
    }

    /// Short label for dumps.
    pub(crate) fn label(&self) -> String {
        match &self.kind {
            NodeKind::Top => "top".to_string(),
            NodeKind::BetaMemory { items } => format!("beta-memory [{}]", items.len()),
            NodeKind::Join(j) => {
                let tests: Vec<String> = j.tests.iter().map(ToString::to_string).collect();
                format!("join {} [{}]", j.pattern, tests.join(", "))
            }
            NodeKind::Negative(n) => format!("not {} [{}]", n.pattern, n.items.len()),
            NodeKind::Ncc { items, .. } => format!("ncc [{}]", items.len()),
            NodeKind::NccPartner { conjuncts, .. } => format!("ncc-partner /{conjuncts}"),
            NodeKind::Bind(b) => format!("bind {} := {}", b.var, b.name),
            NodeKind::Filter(flt) => format!("filter {}", flt.name),
            NodeKind::Production { production, items } => {
                format!("production {production} [{}]", items.len())
            }
        }
    }
}
