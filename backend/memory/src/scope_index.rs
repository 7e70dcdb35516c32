//! In-process index from scope ids (agent, group, context) to entry keys.
//!
//! Positions are handed out in insertion order, so walking a position set
//! yields keys in write order. The index is never persisted; see
//! `ScopedHybridMemory::rebuild_index` for repopulating it after a restart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use memswarm_core::MemswarmError;

use crate::types::{Entry, ScopeQuery};

#[derive(Debug, Clone)]
struct IndexedKey {
    key: String,
    agent_id: Option<String>,
    group_id: Option<String>,
    context_id: String,
}

type ScopeMap = HashMap<String, BTreeSet<u64>>;

#[derive(Debug, Default)]
pub struct ScopeIndex {
    next_position: u64,
    entries: BTreeMap<u64, IndexedKey>,
    positions: HashMap<String, u64>,
    by_agent: ScopeMap,
    by_group: ScopeMap,
    by_context: ScopeMap,
}

impl ScopeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Index an entry under its agent, group and context. Re-indexing an
    /// existing key moves it to the end of the write order.
    pub fn insert(&mut self, entry: &Entry) {
        self.remove(&entry.key);

        let position = self.next_position;
        self.next_position += 1;

        let indexed = IndexedKey {
            key: entry.key.clone(),
            agent_id: entry.agent_id(),
            group_id: entry.group_id(),
            context_id: entry.context_id.clone(),
        };
        if let Some(agent) = &indexed.agent_id {
            self.by_agent.entry(agent.clone()).or_default().insert(position);
        }
        if let Some(group) = &indexed.group_id {
            self.by_group.entry(group.clone()).or_default().insert(position);
        }
        self.by_context
            .entry(indexed.context_id.clone())
            .or_default()
            .insert(position);

        self.positions.insert(indexed.key.clone(), position);
        self.entries.insert(position, indexed);
    }

    /// Drop a key from every scope. Returns whether it was indexed.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(position) = self.positions.remove(key) else {
            return false;
        };
        if let Some(indexed) = self.entries.remove(&position) {
            if let Some(agent) = &indexed.agent_id {
                detach(&mut self.by_agent, agent, position);
            }
            if let Some(group) = &indexed.group_id {
                detach(&mut self.by_group, group, position);
            }
            detach(&mut self.by_context, &indexed.context_id, position);
        }
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Keys matching every supplied dimension, in write order.
    pub fn lookup(&self, query: &ScopeQuery) -> Result<Vec<String>, MemswarmError> {
        if query.is_empty() {
            return Err(MemswarmError::AmbiguousScopeQuery);
        }

        let dimensions = [
            (&self.by_agent, query.agent_id.as_deref()),
            (&self.by_group, query.group_id.as_deref()),
            (&self.by_context, query.context_id.as_deref()),
        ];
        let mut sets: Vec<&BTreeSet<u64>> = Vec::with_capacity(dimensions.len());
        for (map, wanted) in dimensions {
            let Some(id) = wanted else { continue };
            match map.get(id) {
                Some(set) => sets.push(set),
                None => return Ok(Vec::new()),
            }
        }

        sets.sort_by_key(|set| set.len());
        let Some((smallest, rest)) = sets.split_first() else {
            return Ok(Vec::new());
        };

        Ok(smallest
            .iter()
            .filter(|position| rest.iter().all(|set| set.contains(*position)))
            .filter_map(|position| self.entries.get(position))
            .map(|indexed| indexed.key.clone())
            .collect())
    }
}

fn detach(map: &mut ScopeMap, id: &str, position: u64) {
    if let Some(set) = map.get_mut(id) {
        set.remove(&position);
        if set.is_empty() {
            map.remove(id);
        }
    }
}
