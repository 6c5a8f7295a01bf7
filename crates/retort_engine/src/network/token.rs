//! Tokens, WME bookkeeping, and token deletion.

use retort_foundation::{Error, Result, Value};

use super::arena::{AlphaMemoryId, JoinResultId, NodeId, TokenId, WmeId};
use super::node::NodeKind;
use super::{ReteNetwork, keep_first};
use crate::bindings::Bindings;
use crate::condition::Var;
use crate::trace::TraceEvent;
use crate::wme::Wme;

/// A partial match: one WME (or none) on top of a parent token.
#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub(crate) parent: Option<TokenId>,
    pub(crate) wme: Option<WmeId>,
    pub(crate) node: NodeId,
    pub(crate) depth: usize,
    /// Variables bound at this level.
    pub(crate) bindings: Vec<(Var, Value)>,
    pub(crate) children: Vec<TokenId>,
    /// Blocking WMEs, for tokens stored at negative nodes.
    pub(crate) join_results: Vec<JoinResultId>,
    /// Subnetwork matches, for tokens stored at NCC nodes.
    pub(crate) ncc_results: Vec<TokenId>,
    /// The NCC token a partner result blocks.
    pub(crate) owner: Option<TokenId>,
}

/// Network-side state for a live WME.
#[derive(Clone, Debug)]
pub(crate) struct WmeEntry {
    pub(crate) wme: Wme,
    pub(crate) amems: Vec<AlphaMemoryId>,
    pub(crate) tokens: Vec<TokenId>,
    pub(crate) negative_join_results: Vec<JoinResultId>,
}

impl WmeEntry {
    pub(crate) fn new(wme: Wme) -> Self {
        Self {
            wme,
            amems: Vec::new(),
            tokens: Vec::new(),
            negative_join_results: Vec::new(),
        }
    }
}

/// A WME blocking a negative node's token.
#[derive(Copy, Clone, Debug)]
pub(crate) struct JoinResult {
    pub(crate) owner: TokenId,
    pub(crate) wme: WmeId,
}

impl ReteNetwork {
    pub(crate) fn make_token(
        &mut self,
        node: NodeId,
        parent: Option<TokenId>,
        wme: Option<WmeId>,
        bindings: Vec<(Var, Value)>,
    ) -> TokenId {
        let depth = parent.map_or(0, |p| self.tokens[p].depth + 1);
        let id = self.tokens.insert(Token {
            parent,
            wme,
            node,
            depth,
            bindings,
            children: Vec::new(),
            join_results: Vec::new(),
            ncc_results: Vec::new(),
            owner: None,
        });
        if let Some(p) = parent {
            self.tokens[p].children.push(id);
        }
        if let Some(w) = wme {
            self.wmes[w].tokens.push(id);
        }
        id
    }

    /// Walks up from `token` to the ancestor at `depth`.
    pub(crate) fn token_at_depth(&self, token: TokenId, depth: usize) -> Option<TokenId> {
        let mut current = token;
        let start = self.tokens[token].depth;
        if depth > start {
            return None;
        }
        for _ in depth..start {
            current = self.tokens[current].parent?;
        }
        Some(current)
    }

    /// Finds a variable bound at or above `token`.
    pub(crate) fn lookup_binding(&self, token: TokenId, var: &Var) -> Option<&Value> {
        let mut current = Some(token);
        while let Some(t) = current {
            let tok = &self.tokens[t];
            if let Some((_, v)) = tok.bindings.iter().find(|(name, _)| name == var) {
                return Some(v);
            }
            current = tok.parent;
        }
        None
    }

    /// All variables bound along a token chain, plus `extra` at the bottom.
    pub(crate) fn resolve_bindings(
        &self,
        token: Option<TokenId>,
        extra: &[(Var, Value)],
    ) -> Bindings {
        let mut out = Bindings::new();
        for (v, value) in extra {
            out.bind(v.clone(), value.clone());
        }
        let mut current = token;
        while let Some(t) = current {
            let tok = &self.tokens[t];
            for (v, value) in &tok.bindings {
                out.bind(v.clone(), value.clone());
            }
            current = tok.parent;
        }
        out
    }

    /// Deletes every descendant of a token, leaving the token itself, then
    /// propagates any NCC owners the deletion cleared.
    pub(crate) fn delete_descendants_of(&mut self, token: TokenId) -> Result<()> {
        while let Some(&child) = self.tokens.get(token).and_then(|t| t.children.last()) {
            self.delete_token_and_descendants(child)?;
            if self.tokens.contains(child) {
                return Err(Error::internal(format!(
                    "token {child} survived deletion"
                )));
            }
        }
        self.propagate_light_ups()
    }

    /// Deletes a token and its subtree, children first.
    ///
    /// Purely structural: NCC owners left without results are queued for
    /// [`propagate_light_ups`](Self::propagate_light_ups) rather than
    /// activated here.
    pub(crate) fn delete_token_and_descendants(&mut self, root: TokenId) -> Result<()> {
        let mut stack = vec![(root, false)];
        while let Some((token, expanded)) = stack.pop() {
            let Some(tok) = self.tokens.get(token) else {
                continue;
            };
            if !expanded || !tok.children.is_empty() {
                stack.push((token, true));
                stack.extend(tok.children.iter().map(|&c| (c, false)));
                continue;
            }
            self.delete_single_token(token)?;
        }
        Ok(())
    }

    /// Removes one childless token and undoes its bookkeeping.
    fn delete_single_token(&mut self, token: TokenId) -> Result<()> {
        let Some(tok) = self.tokens.remove(token) else {
            return Ok(());
        };
        let node = tok.node;

        let mut unlink_joins = false;
        let mut unlink_negative = false;
        let mut light_up = None;
        match &mut self.nodes[node].kind {
            NodeKind::BetaMemory { items } => {
                items.retain(|&t| t != token);
                unlink_joins = items.is_empty();
            }
            NodeKind::Negative(neg) => {
                neg.items.retain(|&t| t != token);
                unlink_negative = neg.items.is_empty() && !neg.right_unlinked;
                if unlink_negative {
                    neg.right_unlinked = true;
                }
            }
            NodeKind::Ncc { items, .. } => {
                items.retain(|&t| t != token);
            }
            NodeKind::NccPartner {
                ncc,
                buffer,
                results,
                ..
            } => {
                results.retain(|&t| t != token);
                if let Some(pos) = buffer.iter().position(|&t| t == token) {
                    buffer.remove(pos);
                } else if let Some(owner) = tok.owner {
                    light_up = Some((*ncc, owner));
                }
            }
            NodeKind::Production { production, items } => {
                let production = *production;
                items.retain(|&t| t != token);
                self.new_matches.retain(|m| m.token != token);
                self.tracer
                    .record(TraceEvent::ActivationRemoved { production, token });
            }
            NodeKind::Top | NodeKind::Join(_) | NodeKind::Bind(_) | NodeKind::Filter(_) => {
                return Err(Error::internal(format!(
                    "token {token} stored at stateless node {node}"
                )));
            }
        }

        if unlink_joins {
            self.right_unlink_children(node);
        }
        if unlink_negative {
            if let Some(amem) = self.nodes[node].alpha_memory() {
                self.alpha_memories[amem].successors.retain(|&n| n != node);
            }
        }

        for jr in &tok.join_results {
            if let Some(result) = self.join_results.remove(*jr) {
                if let Some(entry) = self.wmes.get_mut(result.wme) {
                    entry.negative_join_results.retain(|r| r != jr);
                }
            }
        }

        for &result in &tok.ncc_results {
            if let Some(r) = self.tokens.remove(result) {
                if let Some(w) = r.wme {
                    self.wmes[w].tokens.retain(|&t| t != result);
                }
                if let Some(p) = r.parent {
                    if let Some(parent) = self.tokens.get_mut(p) {
                        parent.children.retain(|&t| t != result);
                    }
                }
                if let Some(results) = self.partner_results_mut(r.node) {
                    results.retain(|&t| t != result);
                }
            }
        }

        if let Some(w) = tok.wme {
            if let Some(entry) = self.wmes.get_mut(w) {
                entry.tokens.retain(|&t| t != token);
            }
        }
        if let Some(p) = tok.parent {
            if let Some(parent) = self.tokens.get_mut(p) {
                parent.children.retain(|&t| t != token);
            }
        }

        if let Some((ncc, owner)) = light_up {
            if let Some(o) = self.tokens.get_mut(owner) {
                o.ncc_results.retain(|&t| t != token);
                if o.ncc_results.is_empty() {
                    self.pending_light_ups.push((ncc, owner));
                }
            }
        }
        Ok(())
    }

    /// Activates the children of every NCC owner whose last result went away
    /// during a deletion.
    ///
    /// Deletion itself only queues owners, so callbacks never run against a
    /// half-removed structure. Owners deleted or blocked again since they were
    /// queued are skipped. Every queued owner is tried; the first failure is
    /// returned.
    pub(crate) fn propagate_light_ups(&mut self) -> Result<()> {
        let mut first_error = None;
        while !self.pending_light_ups.is_empty() {
            for (ncc, owner) in std::mem::take(&mut self.pending_light_ups) {
                let clear = self
                    .tokens
                    .get(owner)
                    .is_some_and(|o| o.node == ncc && o.ncc_results.is_empty());
                if !clear {
                    continue;
                }
                for child in self.nodes[ncc].children.clone() {
                    let outcome = self.left_activate(child, Some(owner), None, Vec::new());
                    keep_first(&mut first_error, outcome);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn partner_results_mut(&mut self, node: NodeId) -> Option<&mut Vec<TokenId>> {
        match &mut self.nodes.get_mut(node)?.kind {
            NodeKind::NccPartner { results, .. } => Some(results),
            _ => None,
        }
    }

    /// Right-unlinks the linked joins under a beta memory that just emptied.
    fn right_unlink_children(&mut self, memory: NodeId) {
        let children = self.nodes[memory].children.clone();
        for child in children {
            let amem = match &mut self.nodes[child].kind {
                NodeKind::Join(join) if !join.right_unlinked => {
                    join.right_unlinked = true;
                    join.amem
                }
                _ => continue,
            };
            self.alpha_memories[amem].successors.retain(|&n| n != child);
        }
    }
}
