//! The Rete network.
//!
//! WMEs enter through alpha memories keyed by their constant fields and flow
//! down a shared graph of beta nodes. Beta memories and join nodes match
//! positive conditions, negative and NCC nodes match absence, bind and filter
//! nodes extend or prune partial matches, and production nodes collect
//! complete matches for the agenda.
//!
//! Every insertion and removal is incremental: only the partial matches a
//! change affects are touched.

mod activation;
mod alpha;
pub(crate) mod arena;
mod build;
mod inspect;
mod node;
mod token;

pub use alpha::AlphaKey;
pub use arena::{AlphaMemoryId, NodeId, TokenId};
pub use node::{JoinTest, NodeType};

use std::collections::{BTreeMap, HashMap, VecDeque};

use retort_foundation::{Error, ErrorContext, FactId, ProductionId, Result, Value};

use crate::agenda::{Match, MatchSelector};
use crate::bindings::Bindings;
use crate::condition::Production;
use crate::config::NetworkConfig;
use crate::fact::Fact;
use crate::trace::{TraceEvent, Tracer};
use crate::wme::Wme;

use alpha::AlphaMemory;
use arena::{Arena, JoinResultId, WmeId};
use node::{BetaNode, NodeKind};
use token::{JoinResult, Token, WmeEntry};

/// A registered production and the terminal nodes built for it.
#[derive(Clone, Debug)]
pub(crate) struct ProductionEntry {
    pub(crate) production: Production,
    pub(crate) nodes: Vec<NodeId>,
}

/// An incremental Rete matcher.
///
/// All mutation goes through `&mut self`; the network has no interior
/// locking. Use one network per thread or serialize access externally.
pub struct ReteNetwork {
    config: NetworkConfig,
    pub(crate) nodes: Arena<NodeId, BetaNode>,
    pub(crate) top: NodeId,
    pub(crate) alpha_memories: Arena<AlphaMemoryId, AlphaMemory>,
    pub(crate) alpha_index: HashMap<AlphaKey, AlphaMemoryId>,
    pub(crate) tokens: Arena<TokenId, Token>,
    pub(crate) wmes: Arena<WmeId, WmeEntry>,
    wme_index: HashMap<Wme, WmeId>,
    pub(crate) join_results: Arena<JoinResultId, JoinResult>,
    facts: BTreeMap<FactId, Fact>,
    next_fact: u64,
    pub(crate) productions: BTreeMap<ProductionId, ProductionEntry>,
    next_production: u64,
    pub(crate) new_matches: VecDeque<Match>,
    /// NCC owners cleared by a deletion, waiting to be activated.
    pub(crate) pending_light_ups: Vec<(NodeId, TokenId)>,
    selector: Box<dyn MatchSelector>,
    pub(crate) tracer: Tracer,
    /// Nodes created by the `add_production` in progress.
    pub(crate) build_log: Option<Vec<NodeId>>,
}

impl ReteNetwork {
    /// Creates an empty network with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    /// Creates an empty network.
    #[must_use]
    pub fn with_config(config: NetworkConfig) -> Self {
        let mut nodes = Arena::new();
        let top = nodes.insert(BetaNode::new(NodeKind::Top, None));
        Self {
            selector: config.selection.selector(config.seed),
            tracer: Tracer::new(config.tracer.clone()),
            config,
            nodes,
            top,
            alpha_memories: Arena::new(),
            alpha_index: HashMap::new(),
            tokens: Arena::new(),
            wmes: Arena::new(),
            wme_index: HashMap::new(),
            join_results: Arena::new(),
            facts: BTreeMap::new(),
            next_fact: 0,
            productions: BTreeMap::new(),
            next_production: 0,
            new_matches: VecDeque::new(),
            pending_light_ups: Vec::new(),
            build_log: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Replaces the match selector used by `run`.
    pub fn set_selector(&mut self, selector: Box<dyn MatchSelector>) {
        self.selector = selector;
    }

    /// Returns the tracer.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Returns the tracer for reconfiguration.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    // =========================================================================
    // Facts
    // =========================================================================

    /// Registers a fact and inserts its WMEs.
    ///
    /// Nested facts without an id are registered first. The assigned id is
    /// written back into `fact`.
    ///
    /// # Errors
    ///
    /// `DuplicateIdentifier` if the fact already has an id. Nested facts that
    /// already have one are referenced as they are.
    pub fn add_fact(&mut self, fact: &mut Fact) -> Result<FactId> {
        if let Some(id) = fact.id() {
            return Err(Error::duplicate_identifier(id));
        }
        self.tracer.next_step();
        self.insert_fact(fact)
    }

    /// Registers a fact and all of its WMEs, even when a callback fails
    /// partway; the first failure is returned once the fact is complete.
    fn insert_fact(&mut self, fact: &mut Fact) -> Result<FactId> {
        let mut first_error = None;
        for (key, mut nested) in fact.nested_facts() {
            if nested.id().is_none() {
                let outcome = self.insert_fact(&mut nested).map(|_| ());
                keep_first(&mut first_error, outcome);
                fact.replace_nested(key, nested);
            }
        }

        let id = FactId::new(self.next_fact);
        self.next_fact += 1;
        fact.set_id(Some(id));
        self.facts.insert(id, fact.clone());
        self.tracer.record(TraceEvent::FactAdded { fact: id });

        for wme in fact.wmes() {
            let outcome = self
                .insert_wme(wme)
                .map_err(|e| e.with_context(ErrorContext::new().with_source(id.to_string())));
            keep_first(&mut first_error, outcome);
        }
        first_error.map_or(Ok(id), Err)
    }

    /// Retracts a fact and every WME whose identifier is the fact.
    ///
    /// Nested facts stay registered. Returns the fact with its id cleared.
    ///
    /// # Errors
    ///
    /// `UnknownFact` if the id is not registered. A callback failure is
    /// reported after the fact and all of its WMEs are gone.
    pub fn remove_fact(&mut self, id: FactId) -> Result<Fact> {
        if !self.facts.contains_key(&id) {
            return Err(Error::unknown_fact(id));
        }
        self.tracer.next_step();

        let identifier = Value::FactRef(id);
        let doomed: Vec<Wme> = self
            .wmes
            .values()
            .filter(|entry| entry.wme.identifier == identifier)
            .map(|entry| entry.wme.clone())
            .collect();
        let mut first_error = None;
        for wme in &doomed {
            keep_first(&mut first_error, self.delete_wme(wme));
        }

        let mut fact = self.facts.remove(&id).ok_or_else(|| Error::unknown_fact(id))?;
        fact.set_id(None);
        self.tracer.record(TraceEvent::FactRemoved { fact: id });
        first_error.map_or(Ok(fact), Err)
    }

    /// Retracts a fact and adds it again under a new id. A fact that was
    /// never added is simply added.
    ///
    /// # Errors
    ///
    /// `UnknownFact` if `fact` carries an id this network does not know. A
    /// callback failure during the removal does not stop the re-addition;
    /// the first failure is returned.
    pub fn update_fact(&mut self, fact: &mut Fact) -> Result<FactId> {
        let Some(id) = fact.id() else {
            return self.add_fact(fact);
        };
        if !self.facts.contains_key(&id) {
            return Err(Error::unknown_fact(id));
        }
        let removed = self.remove_fact(id).map(|_| ());
        fact.set_id(None);
        let added = self.add_fact(fact);
        match removed {
            Ok(()) => added,
            Err(e) => Err(e),
        }
    }

    /// Returns a registered fact.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    /// Iterates registered facts in id order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().map(|(id, f)| (*id, f))
    }

    // =========================================================================
    // Working memory
    // =========================================================================

    /// Inserts a raw WME. Inserting a WME already present does nothing.
    ///
    /// # Errors
    ///
    /// Propagates failures of bind and filter callbacks.
    pub fn add_wme(&mut self, wme: Wme) -> Result<()> {
        self.tracer.next_step();
        self.insert_wme(wme)
    }

    fn insert_wme(&mut self, wme: Wme) -> Result<()> {
        if self.wme_index.contains_key(&wme) {
            return Ok(());
        }
        let id = self.wmes.insert(WmeEntry::new(wme.clone()));
        self.wme_index.insert(wme.clone(), id);
        self.tracer.record(TraceEvent::WmeAdded { wme: wme.clone() });

        let memories: Vec<AlphaMemoryId> = AlphaKey::covering(&wme)
            .filter_map(|key| self.alpha_index.get(&key).copied())
            .collect();
        for amem in memories {
            self.alpha_activate(amem, id)?;
        }
        Ok(())
    }

    /// Removes a raw WME and everything that depended on it.
    ///
    /// # Errors
    ///
    /// `UnknownWme` if the WME is not in working memory. A callback failure
    /// while re-activating unblocked matches is reported after the WME is
    /// gone.
    pub fn remove_wme(&mut self, wme: &Wme) -> Result<()> {
        if !self.wme_index.contains_key(wme) {
            return Err(Error::unknown_wme(wme.to_string()));
        }
        self.tracer.next_step();
        self.delete_wme(wme)
    }

    /// Takes a WME out of working memory, then re-activates the negative
    /// and NCC tokens it was blocking.
    ///
    /// Every structural change happens before any callback runs, so a failing
    /// bind or filter cannot leave the WME half removed.
    fn delete_wme(&mut self, wme: &Wme) -> Result<()> {
        let Some(id) = self.wme_index.remove(wme) else {
            return Err(Error::unknown_wme(wme.to_string()));
        };

        for amem in self.wmes[id].amems.clone() {
            let Some(memory) = self.alpha_memories.get_mut(amem) else {
                continue;
            };
            memory.items.retain(|&w| w != id);
            if memory.items.is_empty() {
                self.left_unlink_successors(amem);
            }
        }

        let mut first_error = None;
        while let Some(&token) = self.wmes[id].tokens.last() {
            self.delete_token_and_descendants(token)?;
            if self.tokens.contains(token) {
                return Err(Error::internal(format!(
                    "token {token} survived removal of {wme}"
                )));
            }
        }

        let mut unblocked = Vec::new();
        for jr in self.wmes[id].negative_join_results.clone() {
            let Some(result) = self.join_results.remove(jr) else {
                continue;
            };
            let owner = result.owner;
            let Some(tok) = self.tokens.get_mut(owner) else {
                continue;
            };
            match tok.join_results.iter().position(|&r| r == jr) {
                Some(pos) => {
                    tok.join_results.remove(pos);
                    if tok.join_results.is_empty() {
                        unblocked.push(owner);
                    }
                }
                None => keep_first(
                    &mut first_error,
                    Err(Error::unsupported_negation(format!(
                        "join result for {wme} missing from token {owner}"
                    ))),
                ),
            }
        }

        self.wmes.remove(id);
        self.tracer.record(TraceEvent::WmeRemoved { wme: wme.clone() });

        for owner in unblocked {
            let Some(tok) = self.tokens.get(owner) else {
                continue;
            };
            if !tok.join_results.is_empty() {
                continue;
            }
            for child in self.nodes[tok.node].children.clone() {
                let outcome = self.left_activate(child, Some(owner), None, Vec::new());
                keep_first(&mut first_error, outcome);
            }
        }
        keep_first(&mut first_error, self.propagate_light_ups());
        first_error.map_or(Ok(()), Err)
    }

    /// Returns true if the WME is in working memory.
    #[must_use]
    pub fn contains_wme(&self, wme: &Wme) -> bool {
        self.wme_index.contains_key(wme)
    }

    /// Working memory, in insertion order.
    pub fn wmes(&self) -> impl Iterator<Item = &Wme> {
        self.wmes.values().map(|entry| &entry.wme)
    }

    /// Number of WMEs in working memory.
    #[must_use]
    pub fn wme_count(&self) -> usize {
        self.wmes.len()
    }

    // =========================================================================
    // Productions
    // =========================================================================

    /// Compiles a production into the network.
    ///
    /// Existing working memory is matched immediately, so the production
    /// sees facts added before it.
    ///
    /// # Errors
    ///
    /// `DuplicateProduction` if a production with the same name exists.
    /// Callback failures while matching existing facts undo the addition.
    pub fn add_production(&mut self, production: Production) -> Result<ProductionId> {
        if self
            .productions
            .values()
            .any(|entry| entry.production.name() == production.name())
        {
            return Err(Error::duplicate_production(production.name()));
        }
        self.tracer.next_step();

        let id = ProductionId::new(self.next_production);
        self.next_production += 1;
        let name = production.name().to_string();
        let lists: Vec<Vec<_>> = production
            .condition_lists()
            .into_iter()
            .map(<[_]>::to_vec)
            .collect();
        self.productions.insert(
            id,
            ProductionEntry {
                production,
                nodes: Vec::new(),
            },
        );
        self.tracer.record(TraceEvent::ProductionAdded {
            production: id,
            name: name.clone(),
        });

        self.build_log = Some(Vec::new());
        let mut built = Vec::new();
        let mut outcome = Ok(());
        for conditions in &lists {
            match self.build_production_chain(id, conditions) {
                Ok(node) => {
                    if !built.contains(&node) {
                        built.push(node);
                    }
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        let created = self.build_log.take().unwrap_or_default();

        if let Err(e) = outcome {
            self.abandon_production(id, &created)?;
            return Err(e.with_context(ErrorContext::new().with_source(name)));
        }
        if let Some(entry) = self.productions.get_mut(&id) {
            entry.nodes = built;
        }
        Ok(id)
    }

    /// Undoes a failed `add_production`.
    fn abandon_production(&mut self, id: ProductionId, created: &[NodeId]) -> Result<()> {
        for &node in created.iter().rev() {
            // Partners go with their NCC node.
            let unused = self.nodes.get(node).is_some_and(|n| {
                n.all_children.is_empty() && !matches!(n.kind, NodeKind::NccPartner { .. })
            });
            if unused {
                self.delete_node_and_any_unused_ancestors(node)?;
            }
        }
        self.productions.remove(&id);
        self.new_matches.retain(|m| m.production != id);
        self.propagate_light_ups()
    }

    /// Removes a production and collects nodes nothing else uses.
    ///
    /// # Errors
    ///
    /// `UnknownProduction` if the id is not registered.
    pub fn remove_production(&mut self, id: ProductionId) -> Result<Production> {
        let Some(entry) = self.productions.get(&id) else {
            return Err(Error::unknown_production(id.to_string()));
        };
        let nodes = entry.nodes.clone();
        self.tracer.next_step();

        for node in nodes {
            self.delete_node_and_any_unused_ancestors(node)?;
        }
        self.new_matches.retain(|m| m.production != id);
        self.propagate_light_ups()?;

        let entry = self
            .productions
            .remove(&id)
            .ok_or_else(|| Error::unknown_production(id.to_string()))?;
        self.tracer.record(TraceEvent::ProductionRemoved {
            production: id,
            name: entry.production.name().to_string(),
        });
        Ok(entry.production)
    }

    /// Returns a registered production.
    #[must_use]
    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(&id).map(|entry| &entry.production)
    }

    /// Looks a production up by name.
    #[must_use]
    pub fn production_id(&self, name: &str) -> Option<ProductionId> {
        self.productions
            .iter()
            .find(|(_, entry)| entry.production.name() == name)
            .map(|(id, _)| *id)
    }

    /// Iterates registered productions in id order.
    pub fn productions(&self) -> impl Iterator<Item = (ProductionId, &Production)> {
        self.productions
            .iter()
            .map(|(id, entry)| (*id, &entry.production))
    }

    // =========================================================================
    // Agenda
    // =========================================================================

    /// Every current match, grouped by production in id order.
    #[must_use]
    pub fn matches(&self) -> Vec<Match> {
        let mut out = Vec::new();
        for (&production, entry) in &self.productions {
            let salience = entry.production.salience();
            for &node in &entry.nodes {
                for &token in self.nodes[node].items() {
                    out.push(Match {
                        production,
                        token,
                        salience,
                    });
                }
            }
        }
        out
    }

    /// Matches that arrived since they were last drained, oldest first.
    #[must_use]
    pub fn new_matches(&self) -> &VecDeque<Match> {
        &self.new_matches
    }

    /// Takes the oldest undrained match.
    pub fn pop_new_match(&mut self) -> Option<Match> {
        self.new_matches.pop_front()
    }

    /// Drains every undrained match, oldest first.
    pub fn take_new_matches(&mut self) -> Vec<Match> {
        std::mem::take(&mut self.new_matches).into()
    }

    /// Returns true if the match is still valid.
    #[must_use]
    pub fn is_live(&self, m: &Match) -> bool {
        self.tokens.get(m.token).is_some_and(|tok| {
            matches!(
                &self.nodes[tok.node].kind,
                NodeKind::Production { production, .. } if *production == m.production
            )
        })
    }

    /// Resolves a match's variable bindings.
    ///
    /// # Errors
    ///
    /// `StaleMatch` if the match was retracted.
    pub fn bindings(&self, m: &Match) -> Result<Bindings> {
        if !self.is_live(m) {
            return Err(Error::stale_match(format!(
                "{} {}",
                m.production, m.token
            )));
        }
        Ok(self.resolve_bindings(Some(m.token), &[]))
    }

    /// The WMEs a match was built from, top condition first. Levels without
    /// a WME (negations) are skipped.
    ///
    /// # Errors
    ///
    /// `StaleMatch` if the match was retracted.
    pub fn match_wmes(&self, m: &Match) -> Result<Vec<Wme>> {
        if !self.is_live(m) {
            return Err(Error::stale_match(format!(
                "{} {}",
                m.production, m.token
            )));
        }
        let mut out = Vec::new();
        let mut current = Some(m.token);
        while let Some(t) = current {
            let tok = &self.tokens[t];
            if let Some(w) = tok.wme {
                out.push(self.wmes[w].wme.clone());
            }
            current = tok.parent;
        }
        out.reverse();
        Ok(out)
    }

    /// Runs a match's action.
    ///
    /// The match leaves the undrained list. The action may change facts and
    /// productions freely.
    ///
    /// # Errors
    ///
    /// `StaleMatch` if the match was retracted, or whatever the action
    /// returns.
    pub fn fire(&mut self, m: Match) -> Result<()> {
        let bindings = self.bindings(&m)?;
        self.tracer.next_step();
        self.new_matches.retain(|n| n.token != m.token);
        self.tracer.record(TraceEvent::MatchFired {
            production: m.production,
            token: m.token,
        });

        let action = self
            .productions
            .get(&m.production)
            .and_then(|entry| entry.production.action().cloned());
        match action {
            Some(action) => action(self, &bindings).map_err(|e| {
                let name = self
                    .production(m.production)
                    .map_or_else(|| m.production.to_string(), |p| p.name().to_string());
                e.with_context(ErrorContext::new().with_source(name))
            }),
            None => Ok(()),
        }
    }

    /// Fires up to `budget` matches, one at a time, chosen by the selector
    /// among all current matches. Returns how many fired.
    ///
    /// # Errors
    ///
    /// Stops at the first action failure.
    pub fn run(&mut self, budget: usize) -> Result<usize> {
        let mut fired = 0;
        while fired < budget {
            let ready = self.matches();
            let Some(index) = self.selector.select(&ready) else {
                break;
            };
            let Some(&chosen) = ready.get(index) else {
                return Err(Error::internal(format!(
                    "selector chose {index} of {} matches",
                    ready.len()
                )));
            };
            self.fire(chosen)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// [`run`](Self::run) with the configured budget.
    ///
    /// # Errors
    ///
    /// Stops at the first action failure.
    pub fn run_default(&mut self) -> Result<usize> {
        self.run(self.config.run_budget)
    }
}

/// Records `outcome` if it is the first failure seen.
pub(crate) fn keep_first(first: &mut Option<Error>, outcome: Result<()>) {
    if let Err(e) = outcome {
        first.get_or_insert(e);
    }
}

impl Default for ReteNetwork {
    fn default() -> Self {
        Self::new()
    }
}
