//! On-disk location of a module's binary and symbol file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec::{decode_module, encode_module};
use crate::error::ModuleError;
use crate::module::Module;
use crate::symbols::SymbolFile;

/// Extension of companion symbol files
pub const SYMBOL_EXTENSION: &str = "isym";

/// Paths of a module binary and its symbol file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFiles {
    /// Module binary
    pub binary: PathBuf,
    /// Companion symbol file
    pub symbols: PathBuf,
}

impl ModuleFiles {
    /// Create from explicit paths
    pub fn new(binary: impl Into<PathBuf>, symbols: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            symbols: symbols.into(),
        }
    }

    /// Symbol file next to the binary, with the `.isym` extension
    pub fn for_binary(binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        let symbols = binary.with_extension(SYMBOL_EXTENSION);
        Self { binary, symbols }
    }

    /// Whether the symbol file exists
    pub fn has_symbols(&self) -> bool {
        self.symbols.is_file()
    }

    /// Read the binary and, when present, attach the symbol file
    pub fn load(&self) -> Result<Module, ModuleError> {
        let bytes = fs::read(&self.binary).map_err(|e| ModuleError::io(&self.binary, e))?;
        let mut module = decode_module(&bytes)?;
        if self.has_symbols() {
            self.read_symbols()?.apply_to(&mut module)?;
        }
        Ok(module)
    }

    /// Parse the symbol file
    pub fn read_symbols(&self) -> Result<SymbolFile, ModuleError> {
        let json =
            fs::read_to_string(&self.symbols).map_err(|e| ModuleError::io(&self.symbols, e))?;
        SymbolFile::from_json(&json).map_err(|source| ModuleError::Symbols {
            path: self.symbols.clone(),
            source,
        })
    }

    /// Write the binary and symbol file, each atomically
    pub fn store(&self, module: &Module) -> Result<(), ModuleError> {
        let symbols = SymbolFile::from_module(module)
            .to_json()
            .map_err(|source| ModuleError::Symbols {
                path: self.symbols.clone(),
                source,
            })?;
        write_atomically(&self.binary, &encode_module(module))?;
        write_atomically(&self.symbols, symbols.as_bytes())
    }
}

/// Write `bytes` to a temporary sibling of `path` and rename it into place
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ModuleError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| ModuleError::io(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ModuleError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| ModuleError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ModuleError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| ModuleError::io(path, e.error))?;
    Ok(())
}
