use crate::error::FailureKind;
use crate::index::{DocEntry, DocTable, IndexKind};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

pub const METADATA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Statistics and the id -> url table of one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: u32,
    pub index_kind: IndexKind,
    pub created_at: String,
    pub num_documents: u32,
    pub num_terms: usize,
    pub total_tokens: u64,
    pub mean_tokens_per_document: f64,
    pub total_urls: usize,
    /// Urls whose page was fetched successfully, including ones that later failed to index.
    pub visited_urls: usize,
    pub duplicate_urls: usize,
    pub failed_urls: usize,
    pub failures: Vec<FailedUrl>,
    pub elapsed_secs: f64,
    pub documents: Vec<DocEntry>,
}

impl Metadata {
    pub(crate) fn new(index_kind: IndexKind, total_urls: usize) -> Self {
        Self {
            version: METADATA_VERSION,
            index_kind,
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            num_documents: 0,
            num_terms: 0,
            total_tokens: 0,
            mean_tokens_per_document: 0.0,
            total_urls,
            visited_urls: 0,
            duplicate_urls: 0,
            failed_urls: 0,
            failures: Vec::new(),
            elapsed_secs: 0.0,
            documents: Vec::new(),
        }
    }

    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// Rebuild the bidirectional document table. `None` if the stored ids are not dense.
    pub fn doc_table(&self) -> Option<DocTable> {
        DocTable::from_entries(self.documents.clone())
    }

    /// Human readable summary printed at the end of a run.
    pub fn summary(&self) -> String {
        format!(
            "------ Statistics ------\n\
             Index kind: {}\n\
             Number of documents: {}\n\
             Number of terms: {}\n\
             Number of tokens: {}\n\
             Mean number of tokens per document: {:.1}\n\
             ------- Metadata -------\n\
             Number of URLs visited: {}\n\
             Number of duplicate URLs: {}\n\
             Number of failed URLs: {}\n\
             Total number of URLs: {}\n\
             Build time: {:.3}s",
            self.index_kind,
            self.num_documents,
            self.num_terms,
            self.total_tokens,
            self.mean_tokens_per_document,
            self.visited_urls,
            self.duplicate_urls,
            self.failed_urls,
            self.total_urls,
            self.elapsed_secs,
        )
    }
}
