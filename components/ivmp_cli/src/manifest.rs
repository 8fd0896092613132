//! Project manifest (`ivmp.json`, or YAML when the extension says so)

use bytecode_system::ModuleFiles;
use instrumenter::RewriteTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Default instruction budget per test run
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// What a module is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Code under test; rewritten
    Production,
    /// Holds the tests; never rewritten
    Test,
}

/// One module of the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Logical module name
    pub name: String,
    /// Module binary
    pub binary: PathBuf,
    /// Symbol file; defaults to the binary with the `.isym` extension
    #[serde(default)]
    pub symbols: Option<PathBuf>,
    /// Role of the module
    pub role: Role,
}

impl ModuleEntry {
    /// On-disk files of the module
    pub fn files(&self) -> ModuleFiles {
        match &self.symbols {
            Some(symbols) => ModuleFiles::new(&self.binary, symbols),
            None => ModuleFiles::for_binary(&self.binary),
        }
    }

    /// The module as a rewrite target
    pub fn target(&self) -> RewriteTarget {
        RewriteTarget::new(&self.name, self.files())
    }
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from(".ivmp/backup")
}

fn default_step_limit() -> Option<u64> {
    Some(DEFAULT_STEP_LIMIT)
}

/// Project manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Modules in load order
    pub modules: Vec<ModuleEntry>,
    /// Snapshot store for original binaries
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// Instruction budget per test run; `null` disables it
    #[serde(default = "default_step_limit")]
    pub step_limit: Option<u64>,
    /// Regular expression selecting the tests to run
    #[serde(default)]
    pub test_filter: Option<String>,
}

impl Manifest {
    /// Read a manifest and resolve its relative paths against its directory
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let manifest: Manifest = if is_yaml {
            serde_yaml::from_str(&text).map_err(|source| CliError::ManifestYaml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&text).map_err(|source| CliError::Manifest {
                path: path.to_path_buf(),
                source,
            })?
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(manifest.resolved(base))
    }

    /// Make every relative path relative to `base`
    pub fn resolved(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        for module in &mut self.modules {
            module.binary = resolve(&module.binary);
            module.symbols = module.symbols.as_deref().map(resolve);
        }
        self.backup_dir = resolve(&self.backup_dir);
        self
    }

    /// Modules that get rewritten
    pub fn production(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.modules.iter().filter(|m| m.role == Role::Production)
    }

    /// The single test module
    pub fn test_module(&self) -> CliResult<&ModuleEntry> {
        let tests: Vec<&ModuleEntry> = self
            .modules
            .iter()
            .filter(|m| m.role == Role::Test)
            .collect();
        match tests.as_slice() {
            [single] => Ok(single),
            other => Err(CliError::TestModules(other.len())),
        }
    }
}
