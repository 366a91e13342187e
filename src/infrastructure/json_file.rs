//! JSON document node store.
//!
//! The whole forest is a single JSON document. Commits write a temporary
//! file next to the store file and rename it into place, so readers never
//! observe a half-written document.
//!
//! Several handles may share one file, in this process or in others. Each
//! transaction holds an exclusive lock on `<store file>.lock` and starts
//! from the document currently on disk.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, instrument, trace};

use crate::infrastructure::traits::{
    lock_document, DocumentSink, ForestDocument, NodeStore, NodeTransaction, StagedTransaction,
    DOCUMENT_VERSION,
};

/// Node store backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileNodeStore {
    path: PathBuf,
    lock_path: PathBuf,
    document: Mutex<ForestDocument>,
}

impl JsonFileNodeStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty forest; nothing is written until the
    /// first commit.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> io::Result<Self> {
        let document = read_document(path)?;
        debug!("opened store with {} nodes", document.nodes.len());
        Ok(Self {
            path: path.to_path_buf(),
            lock_path: lock_path_for(path),
            document: Mutex::new(document),
        })
    }

    fn store_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Block until this handle owns the store file's advisory lock.
    fn lock_file(&self) -> io::Result<File> {
        fs::create_dir_all(self.store_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock()?;
        trace!("locked {}", self.lock_path.display());
        Ok(file)
    }
}

/// `forest.json` -> `forest.json.lock`
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("forest.json"));
    name.push(".lock");
    path.with_file_name(name)
}

fn read_document(path: &Path) -> io::Result<ForestDocument> {
    match fs::read_to_string(path) {
        Ok(content) => parse_document(&content, path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("store file {} does not exist yet", path.display());
            Ok(ForestDocument::default())
        }
        Err(e) => Err(e),
    }
}

fn parse_document(content: &str, path: &Path) -> io::Result<ForestDocument> {
    let document: ForestDocument = serde_json::from_str(content).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("parse {}: {}", path.display(), e),
        )
    })?;
    if document.version != DOCUMENT_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "unsupported store version {} in {}",
                document.version,
                path.display()
            ),
        ));
    }
    Ok(document)
}

impl DocumentSink for JsonFileNodeStore {
    fn persist(&self, document: &ForestDocument) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(self.store_dir())?;
        serde_json::to_writer_pretty(&mut tmp, document).map_err(io::Error::other)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(
            "persisted {} nodes to {}",
            document.nodes.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl NodeStore for JsonFileNodeStore {
    fn begin(&self) -> io::Result<Box<dyn NodeTransaction + '_>> {
        let mut document = lock_document(&self.document)?;
        let lock_file = self.lock_file()?;
        // Another handle may have committed since this one last looked.
        *document = read_document(&self.path)?;
        Ok(Box::new(
            StagedTransaction::new(document, Some(self)).holding(lock_file),
        ))
    }
}
