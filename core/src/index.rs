use crate::error::AccumulateError;
use rust_stemmers::Stemmer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type DocId = u32;
/// 0-based token offset within a document.
pub type Position = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexKind {
    NonPositional,
    Positional,
}

impl IndexKind {
    /// Infix used in output file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            IndexKind::NonPositional => "non_pos_index",
            IndexKind::Positional => "pos_index",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::NonPositional => f.write_str("non-positional"),
            IndexKind::Positional => f.write_str("positional"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub id: DocId,
    pub url: String,
    pub num_tokens: usize,
}

/// Bidirectional document id <-> url table. Ids are dense and handed out in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DocTable {
    docs: Vec<DocEntry>,
    by_url: HashMap<String, DocId>,
}

impl DocTable {
    pub fn new() -> Self { Self::default() }

    /// Rebuild a table from entries read back from metadata. Entries must be dense from 0.
    pub fn from_entries(mut entries: Vec<DocEntry>) -> Option<Self> {
        entries.sort_by_key(|e| e.id);
        let mut table = Self::new();
        for (expected, entry) in entries.into_iter().enumerate() {
            if entry.id as usize != expected || table.by_url.contains_key(&entry.url) {
                return None;
            }
            table.by_url.insert(entry.url.clone(), entry.id);
            table.docs.push(entry);
        }
        Some(table)
    }

    pub fn id_of(&self, url: &str) -> Option<DocId> { self.by_url.get(url).copied() }

    pub fn url_of(&self, id: DocId) -> Option<&str> {
        self.docs.get(id as usize).map(|d| d.url.as_str())
    }

    pub fn next_id(&self) -> DocId { self.docs.len() as DocId }

    /// Register `url` under the next id. Callers check [`DocTable::id_of`] first.
    pub fn insert(&mut self, url: &str, num_tokens: usize) -> DocId {
        debug_assert!(!self.by_url.contains_key(url));
        let id = self.next_id();
        self.by_url.insert(url.to_string(), id);
        self.docs.push(DocEntry { id, url: url.to_string(), num_tokens });
        id
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn entries(&self) -> &[DocEntry] { &self.docs }
}

/// A concrete inverted index variant fed one document at a time by the engine.
pub trait Accumulator: Default + Serialize + DeserializeOwned + Send {
    const KIND: IndexKind;
    type Posting: Serialize;

    /// Add the tokens of one document. On error the index is left unchanged.
    fn update(&mut self, doc_id: DocId, tokens: &[String]) -> Result<(), AccumulateError>;

    fn posting(&self, term: &str) -> Option<&Self::Posting>;

    fn num_terms(&self) -> usize;

    /// Terms in lexicographic order.
    fn terms(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Copy of the index with every term replaced by its stem; postings of terms
    /// sharing a stem are merged.
    fn stemmed(&self, stemmer: &Stemmer) -> Self;

    fn serialize_posting(&self, term: &str) -> Option<serde_json::Value> {
        self.posting(term).and_then(|p| serde_json::to_value(p).ok())
    }
}

/// Result of a build: the postings plus the document table they refer to.
#[derive(Debug, Default)]
pub struct BuiltIndex<A> {
    pub postings: A,
    pub docs: DocTable,
}
