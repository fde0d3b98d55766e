//! File-backed persistence for the content document.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::content::model::ContentDocument;
use crate::error::{CmsError, CmsResult};

/// Handle to the JSON file holding the content document.
///
/// Nothing is cached: every `load` re-reads the file and every `save`
/// rewrites the whole document.
#[derive(Debug, Clone)]
pub struct ContentStore {
    path: PathBuf,
}

impl ContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize the document. A missing or malformed file is a
    /// storage error; there is no fallback document.
    pub fn load(&self) -> CmsResult<ContentDocument> {
        let file = File::open(&self.path).map_err(|e| CmsError::storage(&self.path, e))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| CmsError::storage(&self.path, e))
    }

    /// Read the document as an untyped JSON object.
    ///
    /// Used by callers that patch a single field and must leave every other
    /// key exactly as stored.
    pub fn load_value(&self) -> CmsResult<Map<String, Value>> {
        let file = File::open(&self.path).map_err(|e| CmsError::storage(&self.path, e))?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(CmsError::storage(&self.path, "document is not a JSON object")),
            Err(e) => Err(CmsError::storage(&self.path, e)),
        }
    }

    /// Serialize with two-space indentation and replace the file contents.
    ///
    /// The document is written to a sibling temp file first and renamed over
    /// the target, so readers never observe a half-written document.
    pub fn save(&self, doc: &ContentDocument) -> CmsResult<()> {
        self.write(doc)
    }

    /// Counterpart of [`load_value`](Self::load_value).
    pub fn save_value(&self, doc: &Map<String, Value>) -> CmsResult<()> {
        self.write(doc)
    }

    fn write<T: Serialize>(&self, doc: &T) -> CmsResult<()> {
        let mut bytes =
            serde_json::to_vec_pretty(doc).map_err(|e| CmsError::storage(&self.path, e))?;
        bytes.push(b'\n');

        let tmp_path = self.temp_path();
        let write_result = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = write_result.and_then(|_| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CmsError::storage(&self.path, e));
        }

        tracing::debug!(path = ?self.path, size = bytes.len(), "Content document saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "content.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
