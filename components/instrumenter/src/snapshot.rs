//! Content-addressed backup store
//!
//! Layout under the backup directory:
//!
//! ```text
//! objects/<blake3 hex>   raw file contents
//! index.json             module name -> object ids of binary and symbols
//! ```
//!
//! Objects are immutable; backing up identical contents twice writes
//! nothing.

use bytecode_system::{write_atomically, ModuleFiles};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::SnapshotError;

const INDEX_FILE: &str = "index.json";
const OBJECTS_DIR: &str = "objects";

/// Object ids backing up one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Object id of the binary
    pub binary: String,
    /// Object id of the symbol file, if the module had one
    pub symbols: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotIndex {
    modules: BTreeMap<String, SnapshotEntry>,
}

/// Backup store rooted at a directory
#[derive(Debug)]
pub struct SnapshotStore {
    root: PathBuf,
    index: SnapshotIndex,
    writes: usize,
}

impl SnapshotStore {
    /// Open the store, reading its index if one exists
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let root = root.into();
        let index_path = root.join(INDEX_FILE);
        let index = match fs::read_to_string(&index_path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| SnapshotError::Index {
                path: index_path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => SnapshotIndex::default(),
            Err(e) => return Err(SnapshotError::io(index_path, e)),
        };
        Ok(Self {
            root,
            index,
            writes: 0,
        })
    }

    /// Backup directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written since the store was opened
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Recorded backup of a module
    pub fn entry(&self, module: &str) -> Option<&SnapshotEntry> {
        self.index.modules.get(module)
    }

    /// Copy the module's current binary and symbol file into the store
    pub fn backup(&mut self, module: &str, files: &ModuleFiles) -> Result<SnapshotEntry, SnapshotError> {
        let binary = self.put_file(&files.binary)?;
        let symbols = if files.has_symbols() {
            Some(self.put_file(&files.symbols)?)
        } else {
            None
        };
        let entry = SnapshotEntry { binary, symbols };

        if self.index.modules.get(module) != Some(&entry) {
            self.index.modules.insert(module.to_string(), entry.clone());
            self.save_index()?;
        }
        info!(module, binary = %entry.binary, "backed up module");
        Ok(entry)
    }

    /// Overwrite the module's files with its most recent backup
    pub fn restore(&self, module: &str, files: &ModuleFiles) -> Result<(), SnapshotError> {
        let entry = self
            .entry(module)
            .ok_or_else(|| SnapshotError::MissingBackup(module.to_string()))?;
        write_atomically(&files.binary, &self.get(&entry.binary)?)?;
        match &entry.symbols {
            Some(id) => write_atomically(&files.symbols, &self.get(id)?)?,
            None => match fs::remove_file(&files.symbols) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(SnapshotError::io(&files.symbols, e)),
            },
        }
        info!(module, "restored module from backup");
        Ok(())
    }

    fn object_path(&self, id: &str) -> PathBuf {
        self.root.join(OBJECTS_DIR).join(id)
    }

    fn put_file(&mut self, path: &Path) -> Result<String, SnapshotError> {
        let bytes = fs::read(path).map_err(|e| SnapshotError::io(path, e))?;
        let id = blake3::hash(&bytes).to_hex().to_string();
        let object = self.object_path(&id);
        if object.is_file() {
            debug!(object = %id, "object already stored");
        } else {
            write_atomically(&object, &bytes)?;
            self.writes += 1;
        }
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Vec<u8>, SnapshotError> {
        let path = self.object_path(id);
        let bytes = fs::read(&path).map_err(|e| SnapshotError::io(&path, e))?;
        if blake3::hash(&bytes).to_hex().as_str() != id {
            return Err(SnapshotError::Corrupt { id: id.to_string() });
        }
        Ok(bytes)
    }

    fn save_index(&mut self) -> Result<(), SnapshotError> {
        let path = self.root.join(INDEX_FILE);
        let json = serde_json::to_string_pretty(&self.index)
            .map_err(|source| SnapshotError::Index {
                path: path.clone(),
                source,
            })?;
        write_atomically(&path, json.as_bytes())?;
        self.writes += 1;
        Ok(())
    }
}
