//! Left and right activation of beta nodes.

use retort_foundation::{Error, Result, Value};

use super::ReteNetwork;
use super::arena::{AlphaMemoryId, NodeId, TokenId, WmeId};
use super::node::{JoinTest, NodeKind, NodeType};
use super::token::JoinResult;
use crate::agenda::Match;
use crate::condition::Var;
use crate::trace::TraceEvent;

/// What a node hands its children: parent token, WME, new bindings.
pub(crate) type Emission = (Option<TokenId>, Option<WmeId>, Vec<(Var, Value)>);

impl ReteNetwork {
    /// Delivers a partial match to a node.
    pub(crate) fn left_activate(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        match self.nodes[node].kind.node_type() {
            NodeType::BetaMemory => self.beta_memory_left(node, parent, wme, bindings),
            NodeType::Negative => self.negative_left(node, parent, wme, bindings),
            NodeType::Ncc => self.ncc_left(node, parent, wme, bindings),
            NodeType::NccPartner => self.ncc_partner_left(node, parent, wme, bindings),
            NodeType::Bind | NodeType::Filter => {
                if let Some((t, w, b)) = self.pass_through(node, (parent, wme, bindings))? {
                    for child in self.nodes[node].children.clone() {
                        self.left_activate(child, t, w, b.clone())?;
                    }
                }
                Ok(())
            }
            NodeType::Production => self.production_left(node, parent, wme, bindings),
            NodeType::Top | NodeType::Join => Err(Error::internal(format!(
                "node {node} cannot take a partial match"
            ))),
        }
    }

    /// Delivers a new WME from the node's alpha memory.
    pub(crate) fn right_activate(&mut self, node: NodeId, wme: WmeId) -> Result<()> {
        match self.nodes[node].kind.node_type() {
            NodeType::Join => self.join_right(node, wme),
            NodeType::Negative => self.negative_right(node, wme),
            _ => Err(Error::internal(format!(
                "node {node} has no alpha memory"
            ))),
        }
    }

    // -------------------------------------------------------------------------
    // Beta memory and join
    // -------------------------------------------------------------------------

    fn beta_memory_left(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        let token = self.make_token(node, parent, wme, bindings);
        if let NodeKind::BetaMemory { items } = &mut self.nodes[node].kind {
            items.push(token);
        }
        for child in self.nodes[node].children.clone() {
            self.join_left(child, token)?;
        }
        Ok(())
    }

    fn join_left(&mut self, node: NodeId, token: TokenId) -> Result<()> {
        let NodeKind::Join(join) = &self.nodes[node].kind else {
            return Err(Error::internal(format!(
                "beta memory child {node} is not a join"
            )));
        };
        let amem = join.amem;
        if join.right_unlinked {
            self.relink_to_alpha_memory(node, amem);
            if let NodeKind::Join(join) = &mut self.nodes[node].kind {
                join.right_unlinked = false;
            }
            if self.alpha_memories[amem].items.is_empty() {
                self.left_unlink(node);
                return Ok(());
            }
        }

        let NodeKind::Join(join) = &self.nodes[node].kind else {
            return Ok(());
        };
        let pattern = join.pattern.clone();
        let tests = join.tests.clone();
        let candidates = self.alpha_memories[amem].items.clone();
        for w in candidates {
            if !self.tokens.contains(token) {
                break;
            }
            if self.passes(&tests, token, w) {
                let bindings = pattern.bind(&self.wmes[w].wme);
                for child in self.nodes[node].children.clone() {
                    self.left_activate(child, Some(token), Some(w), bindings.clone())?;
                }
            }
        }
        Ok(())
    }

    fn join_right(&mut self, node: NodeId, wme: WmeId) -> Result<()> {
        let (parent, left_unlinked) = match &self.nodes[node].kind {
            NodeKind::Join(join) => (self.nodes[node].parent, join.left_unlinked),
            _ => return Ok(()),
        };
        let Some(parent) = parent else {
            return Err(Error::internal(format!("join {node} has no parent")));
        };

        if left_unlinked {
            self.nodes[parent].children.insert(0, node);
            let now_empty = self.nodes[parent].items().is_empty();
            if let NodeKind::Join(join) = &mut self.nodes[node].kind {
                join.left_unlinked = false;
                if now_empty {
                    join.right_unlinked = true;
                }
            }
            if now_empty {
                if let Some(amem) = self.nodes[node].alpha_memory() {
                    self.alpha_memories[amem].successors.retain(|&n| n != node);
                }
                return Ok(());
            }
        }

        let NodeKind::Join(join) = &self.nodes[node].kind else {
            return Ok(());
        };
        let pattern = join.pattern.clone();
        let tests = join.tests.clone();
        let bindings = pattern.bind(&self.wmes[wme].wme);
        let tokens = self.nodes[parent].items().to_vec();
        for token in tokens {
            if !self.tokens.contains(token) || !self.passes(&tests, token, wme) {
                continue;
            }
            for child in self.nodes[node].children.clone() {
                self.left_activate(child, Some(token), Some(wme), bindings.clone())?;
            }
        }
        Ok(())
    }

    pub(crate) fn left_unlink(&mut self, node: NodeId) {
        if let NodeKind::Join(join) = &mut self.nodes[node].kind {
            join.left_unlinked = true;
        }
        if let Some(parent) = self.nodes[node].parent {
            self.nodes[parent].children.retain(|&n| n != node);
        }
    }

    /// Left-unlinks the joins reading a memory that just emptied.
    pub(crate) fn left_unlink_successors(&mut self, amem: AlphaMemoryId) {
        let successors = self.alpha_memories[amem].successors.clone();
        for node in successors {
            let linked = matches!(
                &self.nodes[node].kind,
                NodeKind::Join(join) if !join.left_unlinked
            );
            if linked {
                self.left_unlink(node);
            }
        }
    }

    /// Evaluates join tests of a candidate WME against a token chain.
    pub(crate) fn passes(&self, tests: &[JoinTest], token: TokenId, wme: WmeId) -> bool {
        let candidate = &self.wmes[wme].wme;
        tests.iter().all(|test| match test {
            JoinTest::Field {
                field,
                depth,
                other,
            } => self
                .token_at_depth(token, *depth)
                .and_then(|t| self.tokens[t].wme)
                .is_some_and(|w| self.wmes[w].wme.get(*other) == candidate.get(*field)),
            JoinTest::Intra { field, other } => candidate.get(*field) == candidate.get(*other),
            JoinTest::Binding { field, var } => self
                .lookup_binding(token, var)
                .is_some_and(|v| v == candidate.get(*field)),
        })
    }

    // -------------------------------------------------------------------------
    // Negative
    // -------------------------------------------------------------------------

    fn negative_left(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        let NodeKind::Negative(neg) = &mut self.nodes[node].kind else {
            return Ok(());
        };
        let amem = neg.amem;
        let tests = neg.tests.clone();
        if neg.right_unlinked {
            neg.right_unlinked = false;
            self.relink_to_alpha_memory(node, amem);
        }

        let token = self.make_token(node, parent, wme, bindings);
        if let NodeKind::Negative(neg) = &mut self.nodes[node].kind {
            neg.items.push(token);
        }

        for w in self.alpha_memories[amem].items.clone() {
            if self.passes(&tests, token, w) {
                self.add_join_result(token, w);
            }
        }

        if self.tokens[token].join_results.is_empty() {
            for child in self.nodes[node].children.clone() {
                self.left_activate(child, Some(token), None, Vec::new())?;
            }
        }
        Ok(())
    }

    fn negative_right(&mut self, node: NodeId, wme: WmeId) -> Result<()> {
        let NodeKind::Negative(neg) = &self.nodes[node].kind else {
            return Ok(());
        };
        let tests = neg.tests.clone();
        for token in neg.items.clone() {
            if !self.tokens.contains(token) || !self.passes(&tests, token, wme) {
                continue;
            }
            if self.tokens[token].join_results.is_empty() {
                self.delete_descendants_of(token)?;
            }
            self.add_join_result(token, wme);
        }
        Ok(())
    }

    fn add_join_result(&mut self, owner: TokenId, wme: WmeId) {
        let id = self
            .join_results
            .insert(JoinResult { owner, wme });
        self.tokens[owner].join_results.push(id);
        self.wmes[wme].negative_join_results.push(id);
    }

    // -------------------------------------------------------------------------
    // NCC
    // -------------------------------------------------------------------------

    fn ncc_left(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        let NodeKind::Ncc { partner, .. } = &self.nodes[node].kind else {
            return Ok(());
        };
        let partner = *partner;

        let token = self.make_token(node, parent, wme, bindings);
        if let NodeKind::Ncc { items, .. } = &mut self.nodes[node].kind {
            items.push(token);
        }

        let buffered = match &self.nodes[partner].kind {
            NodeKind::NccPartner { buffer, .. } => buffer.clone(),
            _ => Vec::new(),
        };
        for result in buffered {
            if self.ncc_owner_of(partner, result) != Some(token) {
                continue;
            }
            if let NodeKind::NccPartner { buffer, .. } = &mut self.nodes[partner].kind {
                buffer.retain(|&t| t != result);
            }
            self.tokens[token].ncc_results.push(result);
            self.tokens[result].owner = Some(token);
        }

        if self.tokens[token].ncc_results.is_empty() {
            for child in self.nodes[node].children.clone() {
                self.left_activate(child, Some(token), None, Vec::new())?;
            }
        }
        Ok(())
    }

    fn ncc_partner_left(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        let result = self.make_token(node, parent, wme, bindings);
        if let NodeKind::NccPartner { results, .. } = &mut self.nodes[node].kind {
            results.push(result);
        }

        match self.ncc_owner_of(node, result) {
            Some(owner) => {
                self.tokens[owner].ncc_results.push(result);
                self.tokens[result].owner = Some(owner);
                self.delete_descendants_of(owner)
            }
            None => {
                if let NodeKind::NccPartner { buffer, .. } = &mut self.nodes[node].kind {
                    buffer.push(result);
                }
                Ok(())
            }
        }
    }

    /// Finds the NCC token a partner result belongs to.
    ///
    /// Walking up the subnetwork's levels from the result reaches the
    /// `(parent, wme)` pair the NCC node stored its token with.
    fn ncc_owner_of(&self, partner: NodeId, result: TokenId) -> Option<TokenId> {
        let NodeKind::NccPartner { ncc, conjuncts, .. } = &self.nodes[partner].kind else {
            return None;
        };
        let tok = &self.tokens[result];
        let (mut owner_t, mut owner_w) = (tok.parent, tok.wme);
        for _ in 0..*conjuncts {
            let t = owner_t?;
            owner_w = self.tokens[t].wme;
            owner_t = self.tokens[t].parent;
        }
        self.nodes[*ncc].items().iter().copied().find(|&t| {
            let candidate = &self.tokens[t];
            candidate.parent == owner_t && candidate.wme == owner_w
        })
    }

    // -------------------------------------------------------------------------
    // Bind, filter, production
    // -------------------------------------------------------------------------

    /// Runs a bind or filter node over one partial match.
    pub(crate) fn pass_through(
        &self,
        node: NodeId,
        (parent, wme, mut bindings): Emission,
    ) -> Result<Option<Emission>> {
        match &self.nodes[node].kind {
            NodeKind::Bind(spec) => {
                let resolved = self.resolve_bindings(parent, &bindings);
                let value = (spec.func)(&resolved)?;
                match resolved.get_var(&spec.var) {
                    Some(existing) if *existing != value => return Ok(None),
                    Some(_) => {}
                    None => bindings.push((spec.var.clone(), value)),
                }
                Ok(Some((parent, wme, bindings)))
            }
            NodeKind::Filter(spec) => {
                let resolved = self.resolve_bindings(parent, &bindings);
                if (spec.func)(&resolved)? {
                    Ok(Some((parent, wme, bindings)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(Some((parent, wme, bindings))),
        }
    }

    fn production_left(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> Result<()> {
        let token = self.make_token(node, parent, wme, bindings);
        let NodeKind::Production { production, items } = &mut self.nodes[node].kind else {
            return Ok(());
        };
        items.push(token);
        let production = *production;
        let salience = self
            .productions
            .get(&production)
            .map_or(0, |entry| entry.production.salience());
        self.new_matches.push_back(Match {
            production,
            token,
            salience,
        });
        self.tracer
            .record(TraceEvent::ActivationAdded { production, token });
        Ok(())
    }
}
