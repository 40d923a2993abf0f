//! Build non-positional or positional inverted indexes from a list of urls.

pub mod engine;
pub mod error;
pub mod index;
pub mod metadata;
pub mod non_positional;
pub mod persist;
pub mod positional;
pub mod progress;
pub mod source;
pub mod tokenizer;

pub use engine::{BuildOptions, IndexEngine};
pub use error::{AccumulateError, DocumentError, FailureKind, FetchError, PersistError, TokenizeError};
pub use index::{Accumulator, BuiltIndex, DocEntry, DocId, DocTable, IndexKind, Position};
pub use metadata::{FailedUrl, Metadata};
pub use non_positional::NonPositionalIndex;
pub use persist::{IndexFormat, OutputPaths};
pub use positional::PositionalIndex;
pub use progress::{NullSink, ProgressSink, TracingSink};
pub use source::{PageSource, StaticPages};
pub use tokenizer::{tokenize, Language, Tokenizer, TokenizerConfig};
