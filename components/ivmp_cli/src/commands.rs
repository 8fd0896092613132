//! Subcommand implementations

use bytecode_system::{DebugInfo, Module, ModuleFiles};
use instrumenter::{fingerprint, RewriteOutcome, Rewriter, Stamp};
use localizer::{LocalizationReport, LocalizeError, Localizer, ModuleTestExecutor};
use recorder::Recorder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::error::{CliError, CliResult};
use crate::manifest::Manifest;

/// Options of `ivmp localize`
#[derive(Debug, Clone, Default)]
pub struct LocalizeOptions {
    /// Backup directory override
    pub backup_dir: Option<PathBuf>,
    /// Step budget override
    pub step_limit: Option<u64>,
    /// Test filter override
    pub filter: Option<String>,
    /// Report destination
    pub output: Option<PathBuf>,
    /// Skip the rewrite pass
    pub skip_rewrite: bool,
}

/// Rewrite every production module
pub fn rewrite(manifest: &Manifest, backup_dir: Option<&Path>) -> CliResult<Vec<RewriteOutcome>> {
    let backup_dir = backup_dir.unwrap_or(manifest.backup_dir.as_path());
    let targets: Vec<_> = manifest.production().map(|m| m.target()).collect();
    let mut rewriter = Rewriter::new(backup_dir)?;
    Ok(rewriter.rewrite_all(&targets)?)
}

/// Rewrite, record a baseline, search and rank
pub fn localize(manifest: &Manifest, options: &LocalizeOptions) -> CliResult<LocalizationReport> {
    let test_module = manifest.test_module()?;
    if !options.skip_rewrite {
        rewrite(manifest, options.backup_dir.as_deref())?;
    }

    let mut modules = Vec::with_capacity(manifest.modules.len());
    for entry in &manifest.modules {
        modules.push(entry.files().load()?);
    }

    let mut executor = ModuleTestExecutor::new(modules, &test_module.name)?;
    if let Some(limit) = options.step_limit.or(manifest.step_limit) {
        executor = executor.with_step_limit(limit);
    }
    let recorder = Recorder::new(executor.sites());
    info!(sites = recorder.sites().len(), "loaded site table");

    let mut localizer = Localizer::new(executor, recorder);
    if let Some(filter) = options.filter.as_ref().or(manifest.test_filter.as_ref()) {
        localizer = localizer.with_filter(filter)?;
    }

    localizer.run_baseline();
    let outcome = localizer.search()?;
    let ranked = localizer.rank(&outcome.candidates);
    let baseline = localizer.baseline().ok_or(LocalizeError::NoBaseline)?;
    let report = LocalizationReport::new(baseline, &outcome, &ranked);

    if let Some(output) = &options.output {
        let json = report.to_json().map_err(CliError::Report)?;
        fs::write(output, json).map_err(|e| CliError::io(output, e))?;
        info!(path = %output.display(), "wrote report");
    }
    Ok(report)
}

/// Summary of one module binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    /// Binary path
    pub path: PathBuf,
    /// Logical module name
    pub name: String,
    /// Whether the build was optimized
    pub optimized: bool,
    /// Debug information level
    pub debug_info: DebugInfo,
    /// Whether a symbol file exists
    pub has_symbols: bool,
    /// Relation of the stamp to this rewriter
    pub stamp: Stamp,
    /// Methods with a body
    pub methods: usize,
    /// Instructions over all bodies
    pub instructions: usize,
    /// Instrumentation sites
    pub sites: usize,
}

impl ModuleSummary {
    fn new(path: &Path, files: &ModuleFiles, module: &Module) -> Self {
        Self {
            path: path.to_path_buf(),
            name: module.name.clone(),
            optimized: module.build.optimized,
            debug_info: module.build.debug_info,
            has_symbols: files.has_symbols(),
            stamp: fingerprint::stamp_of(module, fingerprint::current()),
            methods: module.methods.iter().filter(|m| m.body.is_some()).count(),
            instructions: module.instruction_count(),
            sites: module.sites.len(),
        }
    }

    /// One-line description
    pub fn describe(&self) -> String {
        let stamp = match &self.stamp {
            Stamp::Unstamped => "not instrumented".to_string(),
            Stamp::Current => "instrumented".to_string(),
            Stamp::Stale(found) => {
                format!("stale ({})", found.chars().take(12).collect::<String>())
            }
        };
        format!(
            "{} [{}] {}: {} methods, {} instructions, {} sites, {}{}{}",
            self.name,
            self.path.display(),
            stamp,
            self.methods,
            self.instructions,
            self.sites,
            if self.optimized { "optimized" } else { "debug" },
            match self.debug_info {
                DebugInfo::Full => "",
                DebugInfo::SymbolsOnly => ", symbols only",
                DebugInfo::None => ", no debug info",
            },
            if self.has_symbols { "" } else { ", no symbol file" },
        )
    }
}

/// Describe the given binaries and every `.ivm` file below `dir`
pub fn inspect(files: &[PathBuf], dir: Option<&Path>) -> CliResult<Vec<ModuleSummary>> {
    let mut paths = files.to_vec();
    if let Some(dir) = dir {
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let is_module = entry.file_type().is_file()
                && entry.path().extension().map(|ext| ext == "ivm").unwrap_or(false);
            if is_module {
                paths.push(entry.into_path());
            }
        }
    }

    let mut summaries = Vec::with_capacity(paths.len());
    for path in paths {
        let files = ModuleFiles::for_binary(&path);
        let module = files.load()?;
        summaries.push(ModuleSummary::new(&path, &files, &module));
    }
    Ok(summaries)
}
