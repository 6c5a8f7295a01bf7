//! Read-only views of network structure.

use std::fmt::{self, Write as _};

use retort_foundation::ProductionId;

use super::{AlphaMemoryId, NodeId, NodeType, ReteNetwork};
use crate::condition::Pattern;
use crate::wme::Wme;

impl ReteNetwork {
    /// Returns the alpha memory a pattern reads from, if one exists.
    #[must_use]
    pub fn alpha_memory(&self, pattern: &Pattern) -> Option<AlphaMemoryId> {
        self.alpha_index.get(&pattern.alpha_key()).copied()
    }

    /// Number of live alpha memories.
    #[must_use]
    pub fn alpha_memory_count(&self) -> usize {
        self.alpha_memories.len()
    }

    /// Number of WMEs held by an alpha memory.
    #[must_use]
    pub fn alpha_memory_len(&self, amem: AlphaMemoryId) -> Option<usize> {
        self.alpha_memories.get(amem).map(|m| m.items.len())
    }

    /// The alpha memory a join or negative node reads from.
    #[must_use]
    pub fn node_alpha_memory(&self, node: NodeId) -> Option<AlphaMemoryId> {
        self.nodes.get(node).and_then(|n| n.alpha_memory())
    }

    /// Terminal nodes built for a production, one per distinct alternative.
    #[must_use]
    pub fn production_nodes(&self, production: ProductionId) -> Vec<NodeId> {
        self.productions
            .get(&production)
            .map(|entry| entry.nodes.clone())
            .unwrap_or_default()
    }

    /// Ancestors of a node, nearest first, ending at the top node.
    #[must_use]
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes.get(p).and_then(|n| n.parent);
        }
        out
    }

    /// Kind of a live node.
    #[must_use]
    pub fn node_kind(&self, node: NodeId) -> Option<NodeType> {
        self.nodes.get(node).map(|n| n.kind.node_type())
    }

    /// Number of live beta nodes, the top node included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// WMEs along a token's chain, top first.
    #[must_use]
    pub fn token_wmes(&self, token: super::TokenId) -> Vec<Wme> {
        let mut out = Vec::new();
        let mut current = Some(token);
        while let Some(t) = current {
            let Some(tok) = self.tokens.get(t) else {
                break;
            };
            if let Some(entry) = tok.wme.and_then(|w| self.wmes.get(w)) {
                out.push(entry.wme.clone());
            }
            current = tok.parent;
        }
        out.reverse();
        out
    }

    /// Renders the beta network and its alpha memories as Graphviz dot.
    ///
    /// Solid edges are linked parent/child edges, dashed ones are unlinked
    /// children. Alpha memories are boxes with an edge to each successor.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph rete {\n");
        for (id, node) in self.nodes.iter() {
            let _ = writeln!(out, "  {id} [label=\"{}\"];", escape(&node.label()));
            for &child in &node.all_children {
                let style = if node.children.contains(&child) {
                    ""
                } else {
                    " [style=dashed]"
                };
                let _ = writeln!(out, "  {id} -> {child}{style};");
            }
        }
        for (id, amem) in self.alpha_memories.iter() {
            let _ = writeln!(
                out,
                "  {id} [shape=box,label=\"{} [{}]\"];",
                escape(&amem.key.to_string()),
                amem.items.len()
            );
            for &succ in &amem.successors {
                let _ = writeln!(out, "  {id} -> {succ} [color=blue];");
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for ReteNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Productions:")?;
        for (id, entry) in &self.productions {
            writeln!(f, "  {id} {}", entry.production)?;
        }
        writeln!(f, "Facts:")?;
        for (id, fact) in self.facts() {
            writeln!(f, "  {id} {fact}")?;
        }
        writeln!(f, "WMEs:")?;
        for wme in self.wmes() {
            writeln!(f, "  {wme}")?;
        }
        Ok(())
    }
}
