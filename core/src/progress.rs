use crate::error::DocumentError;
use crate::metadata::Metadata;
use crate::DocId;

/// Receives progress events from one build. Handed to the engine at construction.
pub trait ProgressSink: Send + Sync {
    fn on_indexed(&self, _url: &str, _doc_id: DocId, _num_tokens: usize) {}
    fn on_duplicate(&self, _url: &str, _doc_id: DocId) {}
    fn on_failed(&self, _url: &str, _err: &DocumentError) {}
    fn on_finished(&self, _meta: &Metadata) {}
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {}

/// Emits structured `tracing` events.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_indexed(&self, url: &str, doc_id: DocId, num_tokens: usize) {
        tracing::info!(url, doc_id, num_tokens, "indexed page");
    }

    fn on_duplicate(&self, url: &str, doc_id: DocId) {
        tracing::debug!(url, doc_id, "skipped duplicate url");
    }

    fn on_failed(&self, url: &str, err: &DocumentError) {
        tracing::warn!(url, kind = ?err.kind(), error = %err, "failed to index page");
    }

    fn on_finished(&self, meta: &Metadata) {
        tracing::info!(
            kind = %meta.index_kind,
            num_documents = meta.num_documents,
            num_terms = meta.num_terms,
            total_tokens = meta.total_tokens,
            failed_urls = meta.failed_urls,
            duplicate_urls = meta.duplicate_urls,
            elapsed_secs = meta.elapsed_secs,
            "index build complete"
        );
    }
}
