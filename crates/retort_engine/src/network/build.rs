//! Compiling condition lists into shared network structure, and tearing it
//! down again.

use retort_foundation::{Error, ProductionId, Result};

use super::ReteNetwork;
use super::activation::Emission;
use super::arena::{AlphaMemoryId, NodeId};
use super::node::{BetaNode, JoinNode, JoinTest, NegativeNode, NodeKind, NodeType};
use crate::condition::{BindSpec, Condition, FilterSpec, Pattern, Var};
use crate::trace::TraceEvent;

/// What earlier conditions make available to a later one.
#[derive(Clone, Debug)]
pub(crate) struct Scope {
    /// One entry per token depth; `Some` where a positive condition matched.
    levels: Vec<Option<Pattern>>,
    /// Variables produced by bind conditions.
    bound: Vec<Var>,
}

impl Scope {
    pub(crate) fn root() -> Self {
        Self {
            levels: vec![None],
            bound: Vec::new(),
        }
    }

    /// Tests a pattern needs to stay consistent with this scope.
    pub(crate) fn join_tests(&self, pattern: &Pattern) -> Vec<JoinTest> {
        let mut tests = Vec::new();
        for (field, var) in pattern.variables() {
            match pattern.field_of(var) {
                Some(first) if first != field => {
                    tests.push(JoinTest::Intra {
                        field,
                        other: first,
                    });
                    continue;
                }
                _ => {}
            }

            let earlier = self.levels.iter().enumerate().find_map(|(depth, level)| {
                level
                    .as_ref()
                    .and_then(|p| p.field_of(var))
                    .map(|other| (depth, other))
            });
            if let Some((depth, other)) = earlier {
                tests.push(JoinTest::Field {
                    field,
                    depth,
                    other,
                });
            } else if self.bound.contains(var) {
                tests.push(JoinTest::Binding {
                    field,
                    var: var.clone(),
                });
            }
        }
        tests
    }
}

impl ReteNetwork {
    /// Builds (or shares) the chain for one condition list and its terminal.
    pub(crate) fn build_production_chain(
        &mut self,
        production: ProductionId,
        conditions: &[Condition],
    ) -> Result<NodeId> {
        let mut scope = Scope::root();
        let bottom = self.build_or_share_network_for_conditions(self.top, conditions, &mut scope)?;
        self.build_or_share_production_node(bottom, production)
    }

    fn build_or_share_network_for_conditions(
        &mut self,
        parent: NodeId,
        conditions: &[Condition],
        scope: &mut Scope,
    ) -> Result<NodeId> {
        let mut current = parent;
        for condition in conditions {
            current = match condition {
                Condition::Positive(pattern) => {
                    let memory = self.build_or_share_beta_memory(current)?;
                    let tests = scope.join_tests(pattern);
                    let amem = self.build_or_share_alpha_memory(pattern.alpha_key())?;
                    scope.levels.push(Some(pattern.clone()));
                    self.build_or_share_join_node(memory, amem, tests, pattern)
                }
                Condition::Negative(pattern) => {
                    let tests = scope.join_tests(pattern);
                    let amem = self.build_or_share_alpha_memory(pattern.alpha_key())?;
                    scope.levels.push(None);
                    self.build_or_share_negative_node(current, amem, tests, pattern)?
                }
                Condition::Ncc(subconditions) => {
                    let node = self.build_or_share_ncc_nodes(current, subconditions, scope)?;
                    scope.levels.push(None);
                    node
                }
                Condition::Bind(spec) => {
                    let node = self.build_or_share_bind_node(current, spec)?;
                    scope.bound.push(spec.var.clone());
                    node
                }
                Condition::Filter(spec) => self.build_or_share_filter_node(current, spec)?,
            };
        }
        Ok(current)
    }

    /// Finds a child of `parent` satisfying `same`.
    fn shared_child(&self, parent: NodeId, same: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        self.nodes[parent]
            .all_children
            .iter()
            .copied()
            .find(|&c| same(&self.nodes[c].kind))
    }

    /// Stores a node under a reserved id and hooks it below its parent.
    fn attach(&mut self, id: NodeId, kind: NodeKind, parent: NodeId, at_tail: bool) {
        let node_type = kind.node_type();
        self.nodes.fill(id, BetaNode::new(kind, Some(parent)));
        let p = &mut self.nodes[parent];
        if at_tail {
            p.children.push(id);
        } else {
            p.children.insert(0, id);
        }
        p.all_children.push(id);
        if let Some(log) = &mut self.build_log {
            log.push(id);
        }
        self.tracer.record(TraceEvent::NodeCreated {
            node: id,
            kind: node_type,
        });
    }

    fn create_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.nodes.reserve();
        self.attach(id, kind, parent, false);
        id
    }

    fn build_or_share_beta_memory(&mut self, parent: NodeId) -> Result<NodeId> {
        if let Some(existing) =
            self.shared_child(parent, |k| matches!(k, NodeKind::BetaMemory { .. }))
        {
            return Ok(existing);
        }
        let node = self.create_node(NodeKind::BetaMemory { items: Vec::new() }, parent);
        self.update_new_node_with_matches_from_above(node)?;
        Ok(node)
    }

    fn build_or_share_join_node(
        &mut self,
        memory: NodeId,
        amem: AlphaMemoryId,
        tests: Vec<JoinTest>,
        pattern: &Pattern,
    ) -> NodeId {
        let existing = self.shared_child(memory, |k| match k {
            NodeKind::Join(j) => j.amem == amem && j.tests == tests && j.pattern == *pattern,
            _ => false,
        });
        if let Some(existing) = existing {
            return existing;
        }

        let node = self.create_node(
            NodeKind::Join(JoinNode {
                amem,
                tests,
                pattern: pattern.clone(),
                left_unlinked: false,
                right_unlinked: false,
            }),
            memory,
        );
        let alpha = &mut self.alpha_memories[amem];
        alpha.successors.insert(0, node);
        alpha.reference_count += 1;
        let alpha_empty = alpha.items.is_empty();

        // Joins keep no state, so there is nothing to seed; only the
        // unlinking has to reflect which side is empty.
        if self.nodes[memory].items().is_empty() {
            if let NodeKind::Join(join) = &mut self.nodes[node].kind {
                join.right_unlinked = true;
            }
            self.alpha_memories[amem].successors.retain(|&n| n != node);
        } else if alpha_empty {
            self.left_unlink(node);
        }
        node
    }

    fn build_or_share_negative_node(
        &mut self,
        parent: NodeId,
        amem: AlphaMemoryId,
        tests: Vec<JoinTest>,
        pattern: &Pattern,
    ) -> Result<NodeId> {
        let existing = self.shared_child(parent, |k| match k {
            NodeKind::Negative(n) => n.amem == amem && n.tests == tests,
            _ => false,
        });
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let node = self.create_node(
            NodeKind::Negative(NegativeNode {
                amem,
                tests,
                pattern: pattern.clone(),
                items: Vec::new(),
                right_unlinked: false,
            }),
            parent,
        );
        let alpha = &mut self.alpha_memories[amem];
        alpha.successors.insert(0, node);
        alpha.reference_count += 1;

        self.update_new_node_with_matches_from_above(node)?;

        if let NodeKind::Negative(neg) = &mut self.nodes[node].kind {
            if neg.items.is_empty() && !neg.right_unlinked {
                neg.right_unlinked = true;
                self.alpha_memories[amem].successors.retain(|&n| n != node);
            }
        }
        Ok(node)
    }

    fn build_or_share_ncc_nodes(
        &mut self,
        parent: NodeId,
        conditions: &[Condition],
        scope: &Scope,
    ) -> Result<NodeId> {
        let mut inner = scope.clone();
        let bottom = self.build_or_share_network_for_conditions(parent, conditions, &mut inner)?;
        let conjuncts = inner.levels.len() - scope.levels.len();

        let existing = self.shared_child(parent, |k| match k {
            NodeKind::Ncc { partner, .. } => self.nodes[*partner].parent == Some(bottom),
            _ => false,
        });
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let ncc = self.nodes.reserve();
        let partner = self.nodes.reserve();
        // The NCC goes last among its siblings so the subnetwork sees every
        // partial match before the NCC node does.
        self.attach(
            ncc,
            NodeKind::Ncc {
                items: Vec::new(),
                partner,
            },
            parent,
            true,
        );
        self.attach(
            partner,
            NodeKind::NccPartner {
                ncc,
                conjuncts,
                buffer: Vec::new(),
                results: Vec::new(),
            },
            bottom,
            false,
        );

        self.update_new_node_with_matches_from_above(ncc)?;
        self.update_new_node_with_matches_from_above(partner)?;
        Ok(ncc)
    }

    fn build_or_share_bind_node(&mut self, parent: NodeId, spec: &BindSpec) -> Result<NodeId> {
        if let Some(existing) =
            self.shared_child(parent, |k| matches!(k, NodeKind::Bind(b) if b == spec))
        {
            return Ok(existing);
        }
        let node = self.create_node(NodeKind::Bind(spec.clone()), parent);
        self.update_new_node_with_matches_from_above(node)?;
        Ok(node)
    }

    fn build_or_share_filter_node(&mut self, parent: NodeId, spec: &FilterSpec) -> Result<NodeId> {
        if let Some(existing) =
            self.shared_child(parent, |k| matches!(k, NodeKind::Filter(f) if f == spec))
        {
            return Ok(existing);
        }
        let node = self.create_node(NodeKind::Filter(spec.clone()), parent);
        self.update_new_node_with_matches_from_above(node)?;
        Ok(node)
    }

    /// Terminal nodes are only shared between alternatives of one production.
    fn build_or_share_production_node(
        &mut self,
        parent: NodeId,
        production: ProductionId,
    ) -> Result<NodeId> {
        let existing = self.shared_child(parent, |k| {
            matches!(k, NodeKind::Production { production: p, .. } if *p == production)
        });
        if let Some(existing) = existing {
            return Ok(existing);
        }
        let node = self.create_node(
            NodeKind::Production {
                production,
                items: Vec::new(),
            },
            parent,
        );
        self.update_new_node_with_matches_from_above(node)?;
        Ok(node)
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Replays the parent's current output into a freshly built node.
    fn update_new_node_with_matches_from_above(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.nodes[node].parent else {
            return Ok(());
        };
        if self.nodes[node].kind.node_type() == NodeType::Join {
            return Ok(());
        }
        for (t, w, b) in self.emissions_of(parent)? {
            self.left_activate(node, t, w, b)?;
        }
        Ok(())
    }

    /// Everything a node is currently passing to its children.
    fn emissions_of(&self, node: NodeId) -> Result<Vec<Emission>> {
        let mut chain = Vec::new();
        let mut source = node;
        while matches!(
            self.nodes[source].kind,
            NodeKind::Bind(_) | NodeKind::Filter(_)
        ) {
            chain.push(source);
            source = self.nodes[source].parent.ok_or_else(|| {
                Error::internal(format!("pass-through node {source} has no parent"))
            })?;
        }

        let mut out: Vec<Emission> = match &self.nodes[source].kind {
            NodeKind::Top => vec![(None, None, Vec::new())],
            NodeKind::Join(join) => {
                let parent = self.nodes[source].parent.ok_or_else(|| {
                    Error::internal(format!("join {source} has no parent"))
                })?;
                let mut out = Vec::new();
                for &t in self.nodes[parent].items() {
                    for &w in &self.alpha_memories[join.amem].items {
                        if self.passes(&join.tests, t, w) {
                            out.push((Some(t), Some(w), join.pattern.bind(&self.wmes[w].wme)));
                        }
                    }
                }
                out
            }
            NodeKind::Negative(neg) => neg
                .items
                .iter()
                .filter(|&&t| self.tokens[t].join_results.is_empty())
                .map(|&t| (Some(t), None, Vec::new()))
                .collect(),
            NodeKind::Ncc { items, .. } => items
                .iter()
                .filter(|&&t| self.tokens[t].ncc_results.is_empty())
                .map(|&t| (Some(t), None, Vec::new()))
                .collect(),
            NodeKind::BetaMemory { .. } => {
                return Err(Error::internal(format!(
                    "beta memory {source} only feeds joins"
                )));
            }
            NodeKind::NccPartner { .. }
            | NodeKind::Production { .. }
            | NodeKind::Bind(_)
            | NodeKind::Filter(_) => Vec::new(),
        };

        for &step in chain.iter().rev() {
            let mut next = Vec::with_capacity(out.len());
            for emission in out {
                if let Some(e) = self.pass_through(step, emission)? {
                    next.push(e);
                }
            }
            out = next;
        }
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Deletes a childless node, then every ancestor it leaves childless.
    pub(crate) fn delete_node_and_any_unused_ancestors(&mut self, node: NodeId) -> Result<()> {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.top || !self.nodes.contains(n) {
                break;
            }
            let partner = match &self.nodes[n].kind {
                NodeKind::Ncc { partner, .. } => Some(*partner),
                _ => None,
            };
            if let Some(partner) = partner {
                self.delete_node_and_any_unused_ancestors(partner)?;
            }

            for token in self.nodes[n].items().to_vec() {
                self.delete_token_and_descendants(token)?;
            }

            if let Some(amem) = self.nodes[n].alpha_memory() {
                let linked = !self.nodes[n].right_unlinked();
                let alpha = &mut self.alpha_memories[amem];
                if linked {
                    alpha.successors.retain(|&s| s != n);
                }
                alpha.reference_count = alpha.reference_count.saturating_sub(1);
                if alpha.reference_count == 0 {
                    self.delete_alpha_memory(amem);
                }
            }

            let Some(removed) = self.nodes.remove(n) else {
                break;
            };
            self.tracer.record(TraceEvent::NodeRemoved {
                node: n,
                kind: removed.kind.node_type(),
            });

            current = None;
            if let Some(p) = removed.parent {
                if let Some(parent) = self.nodes.get_mut(p) {
                    parent.children.retain(|&c| c != n);
                    parent.all_children.retain(|&c| c != n);
                    if parent.all_children.is_empty() {
                        current = Some(p);
                    }
                }
            }
        }
        Ok(())
    }
}
