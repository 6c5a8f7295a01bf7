//! Trace event and record types.

use retort_foundation::{FactId, ProductionId};

use crate::network::{AlphaKey, AlphaMemoryId, NodeId, NodeType, TokenId};
use crate::wme::Wme;

// =============================================================================
// Trace Event
// =============================================================================

/// Events recorded while the network changes.
#[derive(Clone, Debug)]
pub enum TraceEvent {
    /// A fact was registered.
    FactAdded {
        /// The new fact id.
        fact: FactId,
    },

    /// A fact was retracted.
    FactRemoved {
        /// The retracted fact id.
        fact: FactId,
    },

    /// A WME entered working memory.
    WmeAdded {
        /// The WME.
        wme: Wme,
    },

    /// A WME left working memory.
    WmeRemoved {
        /// The WME.
        wme: Wme,
    },

    /// A production was compiled into the network.
    ProductionAdded {
        /// The production id.
        production: ProductionId,
        /// The production name.
        name: String,
    },

    /// A production was removed.
    ProductionRemoved {
        /// The production id.
        production: ProductionId,
        /// The production name.
        name: String,
    },

    /// A beta node was built.
    NodeCreated {
        /// The node.
        node: NodeId,
        /// Its kind.
        kind: NodeType,
    },

    /// A beta node was collected.
    NodeRemoved {
        /// The node.
        node: NodeId,
        /// Its kind.
        kind: NodeType,
    },

    /// An alpha memory was built.
    AlphaMemoryCreated {
        /// The memory.
        memory: AlphaMemoryId,
        /// Its key.
        key: AlphaKey,
    },

    /// An alpha memory was collected.
    AlphaMemoryRemoved {
        /// The memory.
        memory: AlphaMemoryId,
    },

    /// A production gained a match.
    ActivationAdded {
        /// The production.
        production: ProductionId,
        /// The terminal token.
        token: TokenId,
    },

    /// A production lost a match.
    ActivationRemoved {
        /// The production.
        production: ProductionId,
        /// The terminal token.
        token: TokenId,
    },

    /// A match was fired.
    MatchFired {
        /// The production.
        production: ProductionId,
        /// The terminal token.
        token: TokenId,
    },
}

impl TraceEvent {
    /// Returns a short name for the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FactAdded { .. } => "fact-added",
            Self::FactRemoved { .. } => "fact-removed",
            Self::WmeAdded { .. } => "wme-added",
            Self::WmeRemoved { .. } => "wme-removed",
            Self::ProductionAdded { .. } => "production-added",
            Self::ProductionRemoved { .. } => "production-removed",
            Self::NodeCreated { .. } => "node-created",
            Self::NodeRemoved { .. } => "node-removed",
            Self::AlphaMemoryCreated { .. } => "alpha-memory-created",
            Self::AlphaMemoryRemoved { .. } => "alpha-memory-removed",
            Self::ActivationAdded { .. } => "activation-added",
            Self::ActivationRemoved { .. } => "activation-removed",
            Self::MatchFired { .. } => "match-fired",
        }
    }

    /// Returns true for events about network structure.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NodeCreated { .. }
                | Self::NodeRemoved { .. }
                | Self::AlphaMemoryCreated { .. }
                | Self::AlphaMemoryRemoved { .. }
        )
    }

    /// Returns true for events about the agenda.
    #[must_use]
    pub fn is_activation_event(&self) -> bool {
        matches!(
            self,
            Self::ActivationAdded { .. } | Self::ActivationRemoved { .. } | Self::MatchFired { .. }
        )
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A timestamped trace record.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the session.
    pub id: u64,
    /// The public operation that produced this event.
    pub step: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The trace event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, step: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            step,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
