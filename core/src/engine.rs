use crate::error::{DocumentError, FetchError, PersistError, TokenizeError};
use crate::index::{Accumulator, BuiltIndex};
use crate::metadata::{FailedUrl, Metadata};
use crate::persist::{write_index, write_metadata, IndexFormat, OutputPaths};
use crate::progress::ProgressSink;
use crate::source::PageSource;
use crate::tokenizer::{Language, Tokenizer, TokenizerConfig};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub tokenizer: TokenizerConfig,
    /// Number of fetch workers used by [`IndexEngine::run`]; 1 keeps strict input order.
    pub concurrency: usize,
    pub format: IndexFormat,
    /// Also write a copy of the index with terms stemmed in this language.
    pub stemmed_copy: Option<Language>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { tokenizer: TokenizerConfig::default(), concurrency: 1, format: IndexFormat::Json, stemmed_copy: None }
    }
}

enum Fetched {
    Failed(FetchError),
    Page(Result<Vec<String>, TokenizeError>),
}

struct BuildState<A> {
    index: BuiltIndex<A>,
    meta: Metadata,
}

impl<A: Accumulator> BuildState<A> {
    fn new(total_urls: usize) -> Self {
        Self { index: BuiltIndex::default(), meta: Metadata::new(A::KIND, total_urls) }
    }

    fn skip_duplicate(&mut self, url: &str, sink: &dyn ProgressSink) -> bool {
        match self.index.docs.id_of(url) {
            Some(doc_id) => {
                self.meta.duplicate_urls += 1;
                sink.on_duplicate(url, doc_id);
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, url: &str, err: DocumentError, sink: &dyn ProgressSink) {
        sink.on_failed(url, &err);
        self.meta.failures.push(FailedUrl { url: url.to_string(), kind: err.kind(), reason: err.to_string() });
    }

    fn ingest(&mut self, url: &str, fetched: Fetched, sink: &dyn ProgressSink) {
        let tokens = match fetched {
            Fetched::Failed(err) => return self.fail(url, err.into(), sink),
            Fetched::Page(tokens) => {
                // another worker may have indexed the same url while this one was fetching
                if self.skip_duplicate(url, sink) {
                    return;
                }
                self.meta.visited_urls += 1;
                match tokens {
                    Ok(tokens) => tokens,
                    Err(err) => return self.fail(url, err.into(), sink),
                }
            }
        };
        // the id is only taken once the accumulator accepted the document
        let doc_id = self.index.docs.next_id();
        match self.index.postings.update(doc_id, &tokens) {
            Ok(()) => {
                self.index.docs.insert(url, tokens.len());
                self.meta.total_tokens += tokens.len() as u64;
                sink.on_indexed(url, doc_id, tokens.len());
            }
            Err(err) => self.fail(url, err.into(), sink),
        }
    }

    fn finish(self, elapsed: Duration) -> (BuiltIndex<A>, Metadata) {
        let Self { index, mut meta } = self;
        meta.num_documents = index.docs.len() as u32;
        meta.num_terms = index.postings.num_terms();
        meta.mean_tokens_per_document = if index.docs.is_empty() {
            0.0
        } else {
            meta.total_tokens as f64 / index.docs.len() as f64
        };
        meta.failed_urls = meta.failures.len();
        meta.elapsed_secs = elapsed.as_secs_f64();
        meta.documents = index.docs.entries().to_vec();
        (index, meta)
    }
}

/// Crawl/tokenize/update loop, generic over the index variant `A`.
pub struct IndexEngine<A> {
    tokenizer: Tokenizer,
    options: BuildOptions,
    sink: Arc<dyn ProgressSink>,
    _index: PhantomData<fn() -> A>,
}

impl<A: Accumulator> IndexEngine<A> {
    pub fn new(options: BuildOptions, sink: Arc<dyn ProgressSink>) -> Self {
        Self { tokenizer: Tokenizer::new(&options.tokenizer), options, sink, _index: PhantomData }
    }

    fn fetch<S: PageSource + ?Sized>(&self, url: &str, source: &S) -> Fetched {
        match source.fetch(url) {
            Ok(text) => Fetched::Page(self.tokenizer.tokenize_document(&text)),
            Err(err) => Fetched::Failed(err),
        }
    }

    /// Process `urls` one by one in input order. Never fails: per-url problems are
    /// recorded in the returned metadata.
    pub fn build<S: PageSource + ?Sized>(&self, urls: &[String], source: &S) -> (BuiltIndex<A>, Metadata) {
        let started = Instant::now();
        let sink = &*self.sink;
        let mut state = BuildState::<A>::new(urls.len());
        for url in urls {
            if state.skip_duplicate(url, sink) {
                continue;
            }
            let fetched = self.fetch(url, source);
            state.ingest(url, fetched, sink);
        }
        let (index, meta) = state.finish(started.elapsed());
        sink.on_finished(&meta);
        (index, meta)
    }

    /// Fetch and tokenize with up to `workers` threads. Id assignment and index updates
    /// are serialized behind one lock, so ids are dense but follow completion order.
    pub fn build_concurrent<S>(&self, urls: &[String], source: &S, workers: usize) -> (BuiltIndex<A>, Metadata)
    where
        S: PageSource + Sync + ?Sized,
    {
        let workers = workers.clamp(1, urls.len().max(1));
        if workers == 1 {
            return self.build(urls, source);
        }
        let started = Instant::now();
        let sink = &*self.sink;
        let state = Mutex::new(BuildState::<A>::new(urls.len()));
        let cursor = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(url) = urls.get(i) else { break };
                    if state.lock().skip_duplicate(url, sink) {
                        continue;
                    }
                    let fetched = self.fetch(url, source);
                    state.lock().ingest(url, fetched, sink);
                });
            }
        });
        let (index, meta) = state.into_inner().finish(started.elapsed());
        sink.on_finished(&meta);
        (index, meta)
    }

    /// Build with the configured concurrency, then write the index (and the optional
    /// stemmed copy) followed by the metadata.
    pub fn run<S>(&self, urls: &[String], source: &S, paths: &OutputPaths) -> Result<Metadata, PersistError>
    where
        S: PageSource + Sync + ?Sized,
    {
        let (index, meta) = self.build_concurrent(urls, source, self.options.concurrency);
        let format = self.options.format;
        write_index(&index.postings, &paths.index(A::KIND, format), format)?;
        if let Some(lang) = self.options.stemmed_copy {
            let stemmed = index.postings.stemmed(&lang.stemmer());
            write_index(&stemmed, &paths.stemmed_index(A::KIND, format), format)?;
        }
        write_metadata(&meta, &paths.metadata())?;
        Ok(meta)
    }
}
