use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tempfile::tempdir;
use urlindex_core::persist::{read_index, read_metadata};
use urlindex_core::{
    Accumulator, BuildOptions, DocId, DocumentError, FailureKind, FetchError, IndexEngine, IndexFormat, Language,
    Metadata, NonPositionalIndex, NullSink, OutputPaths, PositionalIndex, ProgressSink, StaticPages,
};

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn pages() -> StaticPages {
    StaticPages::new().with_page("a.com", "cat dog cat").with_page("b.com", "dog")
}

fn engine<A: Accumulator>() -> IndexEngine<A> {
    IndexEngine::new(BuildOptions::default(), Arc::new(NullSink))
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn on_indexed(&self, url: &str, doc_id: DocId, _num_tokens: usize) {
        self.events.lock().push(format!("indexed {url} {doc_id}"));
    }
    fn on_duplicate(&self, url: &str, doc_id: DocId) {
        self.events.lock().push(format!("duplicate {url} {doc_id}"));
    }
    fn on_failed(&self, url: &str, err: &DocumentError) {
        self.events.lock().push(format!("failed {url} {:?}", err.kind()));
    }
    fn on_finished(&self, meta: &Metadata) {
        self.events.lock().push(format!("finished {}", meta.num_documents));
    }
}

#[test]
fn non_positional_scenario_collapses_duplicates() {
    let (index, meta) = engine::<NonPositionalIndex>().build(&urls(&["a.com", "b.com", "a.com"]), &pages());
    assert_eq!(index.postings.posting("cat"), Some(&BTreeSet::from([0])));
    assert_eq!(index.postings.posting("dog"), Some(&BTreeSet::from([0, 1])));
    assert_eq!(meta.num_documents, 2);
    assert_eq!(meta.duplicate_urls, 1);
    assert_eq!(meta.total_tokens, 4);
    assert_eq!(meta.num_terms, 2);
    assert_eq!(index.docs.url_of(1), Some("b.com"));
}

#[test]
fn positional_scenario_records_offsets() {
    let (index, _) = engine::<PositionalIndex>().build(&urls(&["a.com", "b.com", "a.com"]), &pages());
    assert_eq!(index.postings.posting("cat"), Some(&BTreeMap::from([(0, vec![0, 2])])));
    assert_eq!(index.postings.posting("dog"), Some(&BTreeMap::from([(0, vec![1]), (1, vec![0])])));
}

#[test]
fn timeout_is_recorded_and_skipped() {
    let source = pages().with_failure("b.com", FetchError::Timeout);
    let (index, meta) = engine::<NonPositionalIndex>().build(&urls(&["a.com", "b.com"]), &source);
    assert_eq!(meta.failed_urls, 1);
    assert_eq!(meta.failures[0].url, "b.com");
    assert_eq!(meta.failures[0].kind, FailureKind::Fetch);
    assert_eq!(meta.num_documents, 1);
    assert_eq!(index.postings.terms().collect::<Vec<_>>(), vec!["cat", "dog"]);
    assert_eq!(index.postings.posting("dog"), Some(&BTreeSet::from([0])));
}

#[test]
fn ids_are_dense_in_first_successful_fetch_order() {
    let source = StaticPages::new()
        .with_failure("bad", FetchError::NotFound)
        .with_page("x", "one")
        .with_failure("broken", FetchError::Parse("no body".into()))
        .with_page("y", "two")
        .with_page("z", "three");
    let (index, meta) = engine::<NonPositionalIndex>().build(&urls(&["bad", "x", "broken", "y", "x", "z"]), &source);
    let ids: Vec<(DocId, &str)> = index.docs.entries().iter().map(|d| (d.id, d.url.as_str())).collect();
    assert_eq!(ids, vec![(0, "x"), (1, "y"), (2, "z")]);
    assert_eq!(meta.failures_of(FailureKind::Fetch), 1);
    assert_eq!(meta.failures_of(FailureKind::Parse), 1);
    assert_eq!(meta.visited_urls, 3);
    assert_eq!(meta.total_urls, 6);
}

#[test]
fn positional_lists_match_occurrence_counts() {
    let text = "the cat saw the other cat and the dog";
    let source = StaticPages::new().with_page("p", text);
    let (index, _) = engine::<PositionalIndex>().build(&urls(&["p"]), &source);
    let tokens = urlindex_core::tokenizer::tokenize(text);
    for term in index.postings.terms() {
        let positions = index.postings.positions(term, 0).unwrap();
        assert_eq!(positions.len(), tokens.iter().filter(|t| t.as_str() == term).count());
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn sink_sees_every_event() {
    let sink = Arc::new(RecordingSink::default());
    let engine = IndexEngine::<NonPositionalIndex>::new(BuildOptions::default(), sink.clone());
    let source = pages().with_failure("c.com", FetchError::Timeout);
    engine.build(&urls(&["a.com", "c.com", "a.com", "b.com"]), &source);
    assert_eq!(
        *sink.events.lock(),
        vec![
            "indexed a.com 0".to_string(),
            "failed c.com Fetch".to_string(),
            "duplicate a.com 0".to_string(),
            "indexed b.com 1".to_string(),
            "finished 2".to_string(),
        ]
    );
}

#[test]
fn run_writes_files_that_read_back() {
    let dir = tempdir().unwrap();
    let paths = OutputPaths::new(dir.path().join("out/title"));
    let meta = engine::<PositionalIndex>().run(&urls(&["a.com", "b.com"]), &pages(), &paths).unwrap();

    let back: PositionalIndex = read_index(&paths.index(PositionalIndex::KIND, IndexFormat::Json), IndexFormat::Json).unwrap();
    let (original, _) = engine::<PositionalIndex>().build(&urls(&["a.com", "b.com"]), &pages());
    assert_eq!(back.iter().collect::<Vec<_>>(), original.postings.iter().collect::<Vec<_>>());

    let meta_back = read_metadata(&paths.metadata()).unwrap();
    assert_eq!(meta_back.documents, meta.documents);
    assert_eq!(meta_back.num_terms, meta.num_terms);
    assert_eq!(meta_back.total_tokens, 4);
    assert_eq!(meta_back.index_kind, PositionalIndex::KIND);
    let table = meta_back.doc_table().unwrap();
    assert_eq!(table.id_of("b.com"), Some(1));
}

#[test]
fn rebuilding_produces_identical_index_bytes() {
    let dir = tempdir().unwrap();
    let first = OutputPaths::new(dir.path().join("first"));
    let second = OutputPaths::new(dir.path().join("second"));
    let list = urls(&["b.com", "a.com", "b.com"]);
    engine::<NonPositionalIndex>().run(&list, &pages(), &first).unwrap();
    engine::<NonPositionalIndex>().run(&list, &pages(), &second).unwrap();
    let kind = NonPositionalIndex::KIND;
    assert_eq!(
        std::fs::read(first.index(kind, IndexFormat::Json)).unwrap(),
        std::fs::read(second.index(kind, IndexFormat::Json)).unwrap()
    );
}

#[test]
fn non_positional_json_reads_back() {
    let dir = tempdir().unwrap();
    let paths = OutputPaths::new(dir.path().join("np"));
    engine::<NonPositionalIndex>().run(&urls(&["a.com", "b.com", "a.com"]), &pages(), &paths).unwrap();

    let kind = NonPositionalIndex::KIND;
    let back: NonPositionalIndex = read_index(&paths.index(kind, IndexFormat::Json), IndexFormat::Json).unwrap();
    let (original, _) = engine::<NonPositionalIndex>().build(&urls(&["a.com", "b.com", "a.com"]), &pages());
    assert_eq!(back.iter().collect::<Vec<_>>(), original.postings.iter().collect::<Vec<_>>());
    assert_eq!(back.posting("dog"), Some(&BTreeSet::from([0, 1])));
}

#[test]
fn rebuilding_positional_index_produces_identical_bytes() {
    let dir = tempdir().unwrap();
    let first = OutputPaths::new(dir.path().join("first"));
    let second = OutputPaths::new(dir.path().join("second"));
    let list = urls(&["b.com", "a.com", "b.com"]);
    engine::<PositionalIndex>().run(&list, &pages(), &first).unwrap();
    engine::<PositionalIndex>().run(&list, &pages(), &second).unwrap();
    let kind = PositionalIndex::KIND;
    let bytes = std::fs::read(first.index(kind, IndexFormat::Json)).unwrap();
    assert_eq!(bytes, std::fs::read(second.index(kind, IndexFormat::Json)).unwrap());
    assert!(!bytes.is_empty());
}

#[test]
fn stemmed_copy_is_written_next_to_the_index() {
    let dir = tempdir().unwrap();
    let paths = OutputPaths::new(dir.path().join("idx"));
    let options = BuildOptions { stemmed_copy: Some(Language::English), format: IndexFormat::Bincode, ..Default::default() };
    let engine = IndexEngine::<NonPositionalIndex>::new(options, Arc::new(NullSink));
    let source = StaticPages::new().with_page("a", "running").with_page("b", "runs");
    engine.run(&urls(&["a", "b"]), &source, &paths).unwrap();

    let kind = NonPositionalIndex::KIND;
    let plain: NonPositionalIndex = read_index(&paths.index(kind, IndexFormat::Bincode), IndexFormat::Bincode).unwrap();
    let stemmed: NonPositionalIndex =
        read_index(&paths.stemmed_index(kind, IndexFormat::Bincode), IndexFormat::Bincode).unwrap();
    assert_eq!(plain.num_terms(), 2);
    assert_eq!(stemmed.posting("run"), Some(&BTreeSet::from([0, 1])));
}

#[test]
fn concurrent_build_keeps_ids_dense_and_postings_consistent() {
    let mut source = StaticPages::new();
    let mut list = Vec::new();
    for i in 0..40 {
        let url = format!("site{i}.com");
        source = source.with_page(url.clone(), format!("common word{i} common"));
        list.push(url.clone());
        if i % 5 == 0 {
            list.push(url);
        }
    }
    list.push("missing.com".to_string());

    let (index, meta) = engine::<PositionalIndex>().build_concurrent(&list, &source, 8);
    assert_eq!(meta.num_documents, 40);
    assert_eq!(meta.duplicate_urls, 8);
    assert_eq!(meta.failed_urls, 1);
    let mut ids: Vec<DocId> = index.docs.entries().iter().map(|d| d.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..40).collect::<Vec<_>>());
    for entry in index.docs.entries() {
        let n: usize = entry.url.trim_start_matches("site").trim_end_matches(".com").parse().unwrap();
        let term = format!("word{n}");
        assert_eq!(index.postings.positions(&term, entry.id), Some(&[1][..]));
        assert_eq!(index.postings.positions("common", entry.id), Some(&[0, 2][..]));
    }
}
