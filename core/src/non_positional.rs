use crate::error::AccumulateError;
use crate::index::{Accumulator, DocId, IndexKind};
use rust_stemmers::Stemmer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// term -> set of documents containing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonPositionalIndex {
    postings: BTreeMap<String, BTreeSet<DocId>>,
}

impl NonPositionalIndex {
    pub fn new() -> Self { Self::default() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<DocId>)> {
        self.postings.iter().map(|(t, docs)| (t.as_str(), docs))
    }
}

impl Accumulator for NonPositionalIndex {
    const KIND: IndexKind = IndexKind::NonPositional;
    type Posting = BTreeSet<DocId>;

    fn update(&mut self, doc_id: DocId, tokens: &[String]) -> Result<(), AccumulateError> {
        for token in tokens {
            // avoid allocating the key for terms already present
            match self.postings.get_mut(token.as_str()) {
                Some(docs) => { docs.insert(doc_id); }
                None => { self.postings.insert(token.clone(), BTreeSet::from([doc_id])); }
            }
        }
        Ok(())
    }

    fn posting(&self, term: &str) -> Option<&BTreeSet<DocId>> { self.postings.get(term) }

    fn num_terms(&self) -> usize { self.postings.len() }

    fn terms(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.postings.keys().map(String::as_str))
    }

    fn stemmed(&self, stemmer: &Stemmer) -> Self {
        let mut out = Self::new();
        for (term, docs) in &self.postings {
            let stem = stemmer.stem(term).into_owned();
            out.postings.entry(stem).or_default().extend(docs.iter().copied());
        }
        out
    }
}
