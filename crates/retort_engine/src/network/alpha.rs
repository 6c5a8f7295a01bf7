//! Alpha memories: per-pattern sets of WMEs that pass the constant tests.

use std::fmt;

use retort_foundation::{Result, Value};

use super::arena::{AlphaMemoryId, NodeId, WmeId};
use super::node::NodeKind;
use super::ReteNetwork;
use crate::condition::Field;
use crate::trace::TraceEvent;
use crate::wme::Wme;

/// The constant part of a pattern. `None` matches anything.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlphaKey([Option<Value>; 3]);

impl AlphaKey {
    /// Creates a key from identifier, attribute, and value slots.
    #[must_use]
    pub fn new(identifier: Option<Value>, attribute: Option<Value>, value: Option<Value>) -> Self {
        Self([identifier, attribute, value])
    }

    /// Returns the slot for a field.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&Value> {
        let slot = match field {
            Field::Identifier => &self.0[0],
            Field::Attribute => &self.0[1],
            Field::Value => &self.0[2],
        };
        slot.as_ref()
    }

    /// The eight keys a WME can satisfy: each field either literal or
    /// wildcard.
    pub fn covering(wme: &Wme) -> impl Iterator<Item = AlphaKey> + '_ {
        (0u8..8).map(move |mask| {
            let pick = |bit: u8, v: &Value| (mask & bit == 0).then(|| v.clone());
            AlphaKey::new(
                pick(0b100, &wme.identifier),
                pick(0b010, &wme.attribute),
                pick(0b001, &wme.value),
            )
        })
    }

    /// Returns true if the WME agrees with every literal slot.
    #[must_use]
    pub fn admits(&self, wme: &Wme) -> bool {
        Field::ALL
            .into_iter()
            .all(|field| self.get(field).is_none_or(|v| v == wme.get(field)))
    }
}

impl fmt::Debug for AlphaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for AlphaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = |s: &Option<Value>| s.as_ref().map_or_else(|| "*".to_string(), Value::to_string);
        write!(f, "({} {} {})", slot(&self.0[0]), slot(&self.0[1]), slot(&self.0[2]))
    }
}

/// WMEs matching one key, plus the join and negative nodes reading them.
#[derive(Clone, Debug)]
pub(crate) struct AlphaMemory {
    pub(crate) key: AlphaKey,
    pub(crate) items: Vec<WmeId>,
    /// Right-linked successors. Descendants precede their ancestors.
    pub(crate) successors: Vec<NodeId>,
    /// Join and negative nodes using this memory, linked or not.
    pub(crate) reference_count: usize,
}

impl AlphaMemory {
    fn new(key: AlphaKey) -> Self {
        Self {
            key,
            items: Vec::new(),
            successors: Vec::new(),
            reference_count: 0,
        }
    }
}

impl ReteNetwork {
    /// Returns the memory for `key`, creating and seeding it on first use.
    pub(crate) fn build_or_share_alpha_memory(&mut self, key: AlphaKey) -> Result<AlphaMemoryId> {
        if let Some(&id) = self.alpha_index.get(&key) {
            return Ok(id);
        }

        let id = self.alpha_memories.insert(AlphaMemory::new(key.clone()));
        self.alpha_index.insert(key.clone(), id);
        self.tracer.record(TraceEvent::AlphaMemoryCreated {
            memory: id,
            key: key.clone(),
        });

        let seeds: Vec<WmeId> = self
            .wmes
            .iter()
            .filter(|(_, entry)| key.admits(&entry.wme))
            .map(|(w, _)| w)
            .collect();
        for w in seeds {
            self.alpha_activate(id, w)?;
        }
        Ok(id)
    }

    /// Adds a WME to a memory and right-activates the linked successors.
    pub(crate) fn alpha_activate(&mut self, amem: AlphaMemoryId, wme: WmeId) -> Result<()> {
        let memory = &mut self.alpha_memories[amem];
        if memory.items.contains(&wme) {
            return Ok(());
        }
        memory.items.push(wme);
        let successors = memory.successors.clone();
        self.wmes[wme].amems.push(amem);

        for node in successors {
            self.right_activate(node, wme)?;
        }
        Ok(())
    }

    /// Relinks a node to its memory's successor list.
    ///
    /// The node goes just before its nearest right-linked ancestor that reads
    /// the same memory, so descendants keep being activated first.
    pub(crate) fn relink_to_alpha_memory(&mut self, node: NodeId, amem: AlphaMemoryId) {
        let mut ancestor = self.nearest_ancestor_with_same_amem(node, amem);
        while let Some(a) = ancestor {
            if !self.nodes[a].right_unlinked() {
                break;
            }
            ancestor = self.nearest_ancestor_with_same_amem(a, amem);
        }

        let successors = &mut self.alpha_memories[amem].successors;
        match ancestor.and_then(|a| successors.iter().position(|&s| s == a)) {
            Some(pos) => successors.insert(pos, node),
            None => successors.push(node),
        }
    }

    fn nearest_ancestor_with_same_amem(&self, node: NodeId, amem: AlphaMemoryId) -> Option<NodeId> {
        let mut current = self.upward(node);
        while let Some(n) = current {
            if self.nodes[n].alpha_memory() == Some(amem) {
                return Some(n);
            }
            current = self.upward(n);
        }
        None
    }

    /// Next node up the chain. An NCC node continues through its
    /// subnetwork so partners' ancestors are considered too.
    fn upward(&self, node: NodeId) -> Option<NodeId> {
        match &self.nodes[node].kind {
            NodeKind::Ncc { partner, .. } => self.nodes[*partner].parent,
            _ => self.nodes[node].parent,
        }
    }

    /// Removes an alpha memory nothing refers to anymore.
    pub(crate) fn delete_alpha_memory(&mut self, amem: AlphaMemoryId) {
        let Some(memory) = self.alpha_memories.remove(amem) else {
            return;
        };
        self.alpha_index.remove(&memory.key);
        for w in memory.items {
            if let Some(entry) = self.wmes.get_mut(w) {
                entry.amems.retain(|&a| a != amem);
            }
        }
        self.tracer
            .record(TraceEvent::AlphaMemoryRemoved { memory: amem });
    }
}
