use crate::error::AccumulateError;
use crate::index::{Accumulator, DocId, IndexKind, Position};
use rust_stemmers::Stemmer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// term -> document -> offsets of the term in that document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionalIndex {
    postings: BTreeMap<String, BTreeMap<DocId, Vec<Position>>>,
    #[serde(skip)]
    last_doc: Option<DocId>,
}

impl PositionalIndex {
    pub fn new() -> Self { Self::default() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<DocId, Vec<Position>>)> {
        self.postings.iter().map(|(t, docs)| (t.as_str(), docs))
    }

    pub fn positions(&self, term: &str, doc_id: DocId) -> Option<&[Position]> {
        self.postings.get(term)?.get(&doc_id).map(Vec::as_slice)
    }
}

impl Accumulator for PositionalIndex {
    const KIND: IndexKind = IndexKind::Positional;
    type Posting = BTreeMap<DocId, Vec<Position>>;

    fn update(&mut self, doc_id: DocId, tokens: &[String]) -> Result<(), AccumulateError> {
        if tokens.len() > Position::MAX as usize {
            return Err(AccumulateError::PositionOverflow(tokens.len()));
        }
        if let Some(last) = self.last_doc {
            if doc_id <= last {
                return Err(AccumulateError::OutOfOrder { doc_id, last });
            }
        }
        self.last_doc = Some(doc_id);
        for (offset, token) in tokens.iter().enumerate() {
            let offset = offset as Position;
            match self.postings.get_mut(token.as_str()) {
                Some(docs) => docs.entry(doc_id).or_default().push(offset),
                None => {
                    self.postings.insert(token.clone(), BTreeMap::from([(doc_id, vec![offset])]));
                }
            }
        }
        Ok(())
    }

    fn posting(&self, term: &str) -> Option<&Self::Posting> { self.postings.get(term) }

    fn num_terms(&self) -> usize { self.postings.len() }

    fn terms(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.postings.keys().map(String::as_str))
    }

    fn stemmed(&self, stemmer: &Stemmer) -> Self {
        let mut out = Self::new();
        for (term, docs) in &self.postings {
            let merged = out.postings.entry(stemmer.stem(term).into_owned()).or_default();
            for (doc_id, positions) in docs {
                merged.entry(*doc_id).or_default().extend_from_slice(positions);
            }
        }
        // each offset holds exactly one token, so merged lists never collide
        for docs in out.postings.values_mut() {
            for positions in docs.values_mut() {
                positions.sort_unstable();
            }
        }
        out.last_doc = self.last_doc;
        out
    }
}
