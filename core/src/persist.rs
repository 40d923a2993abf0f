use crate::error::PersistError;
use crate::index::{Accumulator, IndexKind};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::ffi::OsString;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    #[default]
    Json,
    Bincode,
}

impl IndexFormat {
    pub fn extension(self) -> &'static str {
        match self {
            IndexFormat::Json => "json",
            IndexFormat::Bincode => "bin",
        }
    }
}

/// File names derived from a single output prefix, e.g. `out/title` ->
/// `out/title.pos_index.json` and `out/title.metadata.json`.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    prefix: PathBuf,
}

impl OutputPaths {
    pub fn new<P: AsRef<Path>>(prefix: P) -> Self {
        Self { prefix: prefix.as_ref().to_path_buf() }
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut s: OsString = self.prefix.clone().into_os_string();
        s.push(suffix);
        PathBuf::from(s)
    }

    pub fn index(&self, kind: IndexKind, format: IndexFormat) -> PathBuf {
        self.with_suffix(&format!(".{}.{}", kind.file_tag(), format.extension()))
    }

    pub fn stemmed_index(&self, kind: IndexKind, format: IndexFormat) -> PathBuf {
        self.with_suffix(&format!(".stemmed.{}.{}", kind.file_tag(), format.extension()))
    }

    pub fn metadata(&self) -> PathBuf { self.with_suffix(".metadata.json") }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io { path: path.to_path_buf(), source }
}

/// Write `path` through a temporary file in the same directory that is renamed into
/// place once fully flushed. The temporary file is removed if anything fails.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), PersistError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PersistError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    create_dir_all(dir).map_err(io_err(dir))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err(path))?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        write(&mut w)?;
        w.flush().map_err(io_err(path))?;
    }
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| PersistError::Io { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}

pub fn write_index<A: Accumulator>(index: &A, path: &Path, format: IndexFormat) -> Result<(), PersistError> {
    write_atomic(path, |w| match format {
        IndexFormat::Json => {
            let mut ser = Serializer::with_formatter(&mut *w, PrettyFormatter::with_indent(b"    "));
            index.serialize(&mut ser).map_err(|source| PersistError::Json { path: path.to_path_buf(), source })?;
            w.write_all(b"\n").map_err(io_err(path))
        }
        IndexFormat::Bincode => bincode::serialize_into(w, index)
            .map_err(|source| PersistError::Bincode { path: path.to_path_buf(), source }),
    })?;
    tracing::debug!(path = %path.display(), terms = index.num_terms(), "wrote index");
    Ok(())
}

pub fn read_index<A: Accumulator>(path: &Path, format: IndexFormat) -> Result<A, PersistError> {
    let f = File::open(path).map_err(io_err(path))?;
    let reader = BufReader::new(f);
    match format {
        IndexFormat::Json => serde_json::from_reader(reader)
            .map_err(|source| PersistError::Json { path: path.to_path_buf(), source }),
        IndexFormat::Bincode => bincode::deserialize_from(reader)
            .map_err(|source| PersistError::Bincode { path: path.to_path_buf(), source }),
    }
}

pub fn write_metadata(meta: &Metadata, path: &Path) -> Result<(), PersistError> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, meta)
            .map_err(|source| PersistError::Json { path: path.to_path_buf(), source })?;
        w.write_all(b"\n").map_err(io_err(path))
    })
}

pub fn read_metadata(path: &Path) -> Result<Metadata, PersistError> {
    let f = File::open(path).map_err(io_err(path))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|source| PersistError::Json { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NonPositionalIndex, PositionalIndex};
    use crate::tokenizer::tokenize;

    #[test]
    fn output_paths_follow_prefix() {
        let paths = OutputPaths::new("out/title");
        assert_eq!(paths.index(IndexKind::Positional, IndexFormat::Json), PathBuf::from("out/title.pos_index.json"));
        assert_eq!(
            paths.stemmed_index(IndexKind::NonPositional, IndexFormat::Bincode),
            PathBuf::from("out/title.stemmed.non_pos_index.bin")
        );
        assert_eq!(paths.metadata(), PathBuf::from("out/title.metadata.json"));
    }

    #[test]
    fn json_layout_is_sorted_by_term() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.json");
        let mut idx = NonPositionalIndex::new();
        idx.update(0, &tokenize("zeta alpha")).unwrap();
        idx.update(1, &tokenize("alpha")).unwrap();
        write_index(&idx, &path, IndexFormat::Json).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        assert!(alpha < zeta);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"alpha": [0, 1], "zeta": [0]}));
    }

    #[test]
    fn bincode_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.bin");
        let mut idx = PositionalIndex::new();
        idx.update(0, &tokenize("a b a")).unwrap();
        write_index(&idx, &path, IndexFormat::Bincode).unwrap();
        let back: PositionalIndex = read_index(&path, IndexFormat::Bincode).unwrap();
        assert_eq!(back.positions("a", 0), Some(&[0, 2][..]));
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        let res = write_atomic(&path, |_| {
            Err(PersistError::Io { path: path.clone(), source: std::io::Error::other("boom") })
        });
        assert!(res.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_target_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // a directory already sits where the file should go
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        let err = write_index(&NonPositionalIndex::new(), &path, IndexFormat::Json).unwrap_err();
        assert_eq!(err.path(), path.as_path());
    }
}
