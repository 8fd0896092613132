//! Rewrite pass over a set of modules
//!
//! A pass loads every target, restores modules stamped by another rewriter
//! version, checks build preconditions, backs up and then rewrites each
//! module that is not already current. Site ids come from one counter per
//! pass, continuing after the largest id of any module left untouched.

use bytecode_system::{Module, ModuleFiles};
use tracing::{info, warn};

use crate::error::RewriteError;
use crate::fingerprint::{self, stamp, stamp_of, Stamp};
use crate::rewriter::{instrument, SiteIdAllocator};
use crate::snapshot::SnapshotStore;

/// A module to rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget {
    /// Logical module name, also the backup key
    pub name: String,
    /// Binary and symbol file
    pub files: ModuleFiles,
}

impl RewriteTarget {
    /// Create a target
    pub fn new(name: impl Into<String>, files: ModuleFiles) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// What a pass did to one module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStatus {
    /// Already stamped with the current fingerprint; nothing written
    UpToDate,
    /// Instrumented and written back
    Rewritten {
        /// Number of sites inserted
        sites: usize,
        /// Whether a stale copy was restored from backup first
        restored: bool,
    },
}

/// Per-module result of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Module name
    pub module: String,
    /// What happened
    pub status: RewriteStatus,
}

struct Loaded {
    module: Module,
    current: bool,
    restored: bool,
}

/// Drives rewrite passes against one backup store
#[derive(Debug)]
pub struct Rewriter {
    store: SnapshotStore,
    fingerprint: String,
}

impl Rewriter {
    /// Rewriter with the compiled-in fingerprint, backing up into `backup_dir`
    pub fn new(backup_dir: impl Into<std::path::PathBuf>) -> Result<Self, RewriteError> {
        Ok(Self {
            store: SnapshotStore::open(backup_dir)?,
            fingerprint: fingerprint::current().to_string(),
        })
    }

    /// Use `fingerprint` instead of the compiled-in one
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    /// Fingerprint stamped into rewritten modules
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The backup store
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.store
    }

    /// Rewrite a single module
    pub fn rewrite(&mut self, target: &RewriteTarget) -> Result<RewriteStatus, RewriteError> {
        let mut outcomes = self.rewrite_all(std::slice::from_ref(target))?;
        Ok(outcomes
            .pop()
            .map_or(RewriteStatus::UpToDate, |outcome| outcome.status))
    }

    /// Rewrite every target. Stops at the first failing module.
    pub fn rewrite_all(
        &mut self,
        targets: &[RewriteTarget],
    ) -> Result<Vec<RewriteOutcome>, RewriteError> {
        let mut loaded = Vec::with_capacity(targets.len());
        for target in targets {
            loaded.push(self.load(target)?);
        }

        for (target, entry) in targets.iter().zip(&loaded) {
            if !entry.current {
                check_preconditions(target, &entry.module)?;
            }
        }

        let mut ids = SiteIdAllocator::after(
            loaded
                .iter()
                .filter(|entry| entry.current)
                .filter_map(|entry| entry.module.max_site_id())
                .max(),
        );
        let fields: Vec<Module> = loaded.iter().map(|entry| entry.module.clone()).collect();

        let mut outcomes = Vec::with_capacity(targets.len());
        for (target, entry) in targets.iter().zip(loaded) {
            if entry.current {
                info!(module = %target.name, "module is up to date");
                outcomes.push(RewriteOutcome {
                    module: target.name.clone(),
                    status: RewriteStatus::UpToDate,
                });
                continue;
            }

            self.store.backup(&target.name, &target.files)?;

            let mut module = entry.module;
            let sites = instrument(&mut module, &fields, &mut ids)?;
            let count = sites.len();
            module.sites = sites;
            stamp(&mut module, &self.fingerprint);
            target.files.store(&module)?;

            info!(
                module = %target.name,
                sites = count,
                fingerprint = %self.fingerprint,
                "rewrote module"
            );
            outcomes.push(RewriteOutcome {
                module: target.name.clone(),
                status: RewriteStatus::Rewritten {
                    sites: count,
                    restored: entry.restored,
                },
            });
        }
        Ok(outcomes)
    }

    fn load(&self, target: &RewriteTarget) -> Result<Loaded, RewriteError> {
        let module = target.files.load()?;
        match stamp_of(&module, &self.fingerprint) {
            Stamp::Current => Ok(Loaded {
                module,
                current: true,
                restored: false,
            }),
            Stamp::Unstamped => Ok(Loaded {
                module,
                current: false,
                restored: false,
            }),
            Stamp::Stale(found) => {
                warn!(
                    module = %target.name,
                    found = %found,
                    "module was rewritten by another rewriter version, restoring"
                );
                self.store.restore(&target.name, &target.files)?;
                Ok(Loaded {
                    module: target.files.load()?,
                    current: false,
                    restored: true,
                })
            }
        }
    }
}

fn check_preconditions(target: &RewriteTarget, module: &Module) -> Result<(), RewriteError> {
    if !module.build.is_instrumentable() {
        return Err(RewriteError::NotInstrumentable {
            module: target.name.clone(),
            optimized: module.build.optimized,
            debug_info: module.build.debug_info,
        });
    }
    if !target.files.has_symbols() {
        return Err(RewriteError::MissingSymbols {
            module: target.name.clone(),
            path: target.files.symbols.clone(),
        });
    }
    Ok(())
}
