//! Caches and the Cache Store.
//!
//! The store keeps every cache ever minted as a memento (a serialized
//! snapshot) instead of a live object. Restoring is a pure deserialize, so a
//! cache's token set is frozen in storage no matter what the generator does
//! later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cells::{Cell, CellId};
use crate::token::Token;

/// Mutable container of tokens anchored to one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cache {
    pub cell: Cell,
    /// Token count decided at mint time; never changes afterwards.
    pub minted: u32,
    /// Held tokens, oldest first. The last element is the top of the stack.
    pub tokens: Vec<Token>,
}

impl Cache {
    /// Decide a cache's initial contents: serials `0..count` of its own cell.
    pub fn mint(cell: Cell, count: u32) -> Self {
        let id = cell.id();
        Self {
            cell,
            minted: count,
            tokens: (0..count).map(|serial| Token::new(id, serial)).collect(),
        }
    }

    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token that the next collect would take.
    pub fn top(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Popup text: the cell key followed by one line per held token.
    pub fn describe(&self) -> String {
        let mut out = format!("Cache {} ({} tokens)", self.id(), self.tokens.len());
        for token in self.tokens.iter().rev() {
            out.push('\n');
            out.push_str(&token.identity());
        }
        out
    }

    /// Freeze this cache into its durable form.
    pub fn to_memento(&self) -> CacheMemento {
        let record = CacheRecord {
            cell: self.cell,
            minted: self.minted,
            tokens: self.tokens.clone(),
        };
        // Plain numbers, strings and vectors only; encoding cannot fail.
        CacheMemento(serde_json::to_string(&record).unwrap_or_default())
    }

    /// Thaw a cache from its durable form.
    pub fn from_memento(memento: &CacheMemento) -> Result<Self, serde_json::Error> {
        let record: CacheRecord = serde_json::from_str(&memento.0)?;
        Ok(Self {
            cell: record.cell,
            minted: record.minted,
            tokens: record.tokens,
        })
    }
}

/// On-disk schema of a cache, decoupled from `Cache`'s field layout.
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    cell: Cell,
    minted: u32,
    tokens: Vec<Token>,
}

/// Opaque serialized snapshot of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheMemento(String);

impl CacheMemento {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheMemento {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Errors from Cache Store lookups and restores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no cache stored for cell {0}")]
    NotFound(CellId),
    #[error("corrupt cache entry {key:?}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Authoritative state of every minted cache, keyed by cell identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStore {
    entries: BTreeMap<CellId, CacheMemento>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: CellId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Restore the cache stored for `id`.
    pub fn get(&self, id: CellId) -> Result<Cache, StoreError> {
        let memento = self.entries.get(&id).ok_or(StoreError::NotFound(id))?;
        Cache::from_memento(memento).map_err(|e| StoreError::Corrupt {
            key: id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Record a cache. Returns `true` when this write minted the entry.
    pub fn put(&mut self, cache: &Cache) -> bool {
        self.entries.insert(cache.id(), cache.to_memento()).is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored identities in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.entries.keys().copied()
    }

    /// Sum of tokens currently held across all stored caches.
    pub fn token_total(&self) -> Result<usize, StoreError> {
        self.entries
            .keys()
            .map(|&id| self.get(id).map(|c| c.len()))
            .sum()
    }

    /// Durable form: `("{i},{j}", memento)` pairs ordered by identity.
    pub fn serialize_all(&self) -> Vec<(String, CacheMemento)> {
        self.entries
            .iter()
            .map(|(id, m)| (id.to_string(), m.clone()))
            .collect()
    }

    /// Replace the whole store from its durable form.
    ///
    /// Every entry is validated first; on error the current contents are
    /// left untouched.
    pub fn restore_all(&mut self, entries: Vec<(String, CacheMemento)>) -> Result<(), StoreError> {
        let mut restored = BTreeMap::new();
        for (key, memento) in entries {
            let corrupt = |reason: String| StoreError::Corrupt {
                key: key.clone(),
                reason,
            };
            let id: CellId = key.parse().map_err(|e| corrupt(format!("{}", e)))?;
            let cache = Cache::from_memento(&memento).map_err(|e| corrupt(e.to_string()))?;
            if cache.id() != id {
                return Err(corrupt(format!("memento belongs to cell {}", cache.id())));
            }
            restored.insert(id, memento);
        }
        self.entries = restored;
        Ok(())
    }

    /// Forget every cache (world reset).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
