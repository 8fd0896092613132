//! The value hook used by the search driver

use core_types::Value;
use interpreter::{HookFault, HookSite, ValueHook};
use std::collections::HashMap;
use tracing::trace;

use crate::error::HookError;
use crate::mapping::SubstitutionMapping;
use crate::profile::ValueProfile;
use crate::sites::SiteTable;

/// What the hook does with observed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Record into the current test's profile and return values unchanged
    Recording,
    /// Serve overrides; observed values go to the replay profile
    Replay,
}

/// Recorder state shared by every hook call of a run.
///
/// The driver owns the recorder and lends it to the interpreter for exactly
/// one test at a time:
///
/// ```text
/// set_mode -> begin_test -> [install] -> run -> end_test -> [clear_overrides]
/// ```
#[derive(Debug)]
pub struct Recorder {
    mode: Mode,
    sites: SiteTable,
    current: Option<String>,
    profiles: HashMap<String, ValueProfile>,
    replay: Option<ValueProfile>,
    mapping: SubstitutionMapping,
}

impl Recorder {
    /// Recorder in recording mode over `sites`
    pub fn new(sites: SiteTable) -> Self {
        Self {
            mode: Mode::Recording,
            sites,
            current: None,
            profiles: HashMap::new(),
            replay: None,
            mapping: SubstitutionMapping::new(),
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Loaded site table
    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    /// Test currently running
    pub fn current_test(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Start a test. In recording mode the test's profile starts empty; in
    /// replay mode the replay profile does.
    pub fn begin_test(&mut self, test: impl Into<String>) {
        let test = test.into();
        match self.mode {
            Mode::Recording => {
                self.profiles
                    .insert(test.clone(), ValueProfile::new(test.clone()));
            }
            Mode::Replay => self.replay = Some(ValueProfile::new(test.clone())),
        }
        self.current = Some(test);
    }

    /// Finish the current test
    pub fn end_test(&mut self) {
        self.current = None;
    }

    /// Recorded profile of `test`
    pub fn profile(&self, test: &str) -> Option<&ValueProfile> {
        self.profiles.get(test)
    }

    /// Remove and return the recorded profile of `test`
    pub fn take_profile(&mut self, test: &str) -> Option<ValueProfile> {
        self.profiles.remove(test)
    }

    /// Observations of the last replay run
    pub fn replay_profile(&self) -> Option<&ValueProfile> {
        self.replay.as_ref()
    }

    /// Active overrides
    pub fn mapping(&self) -> &SubstitutionMapping {
        &self.mapping
    }

    /// Type-check and install an override
    pub fn install(&mut self, site: u32, value: Value) -> Result<(), HookError> {
        self.mapping.install(&self.sites, site, value)
    }

    /// Remove the override for `site`
    pub fn uninstall(&mut self, site: u32) -> Option<Value> {
        self.mapping.uninstall(site)
    }

    /// Remove every override
    pub fn clear_overrides(&mut self) {
        self.mapping.clear();
    }

    fn observe(&mut self, site: &HookSite, value: Value) -> Result<Value, HookError> {
        let test = self
            .current
            .clone()
            .ok_or(HookError::NoCurrentTest { site: site.id })?;
        let record = self.sites.get(site.id).ok_or(HookError::UnknownSite(site.id))?;
        if record.ty != site.ty {
            return Err(HookError::SiteType {
                site: site.id,
                declared: record.ty.clone(),
                hooked: site.ty.clone(),
            });
        }
        if !value.is_assignable_to(&site.ty) {
            return Err(HookError::ValueType {
                site: site.id,
                expected: site.ty.clone(),
                found: value.describe(),
            });
        }
        trace!(test = %test, site = site.id, value = %value, "hook");

        // profiles own detached copies of observed objects
        let observed = value.deep_copy();
        match self.mode {
            Mode::Recording => {
                self.profiles
                    .entry(test.clone())
                    .or_insert_with(|| ValueProfile::new(test))
                    .record(site.id, site.ty.clone(), observed);
                Ok(value)
            }
            Mode::Replay => {
                self.replay
                    .get_or_insert_with(|| ValueProfile::new(test))
                    .record(site.id, site.ty.clone(), observed);
                Ok(self.mapping.get(site.id).cloned().unwrap_or(value))
            }
        }
    }
}

impl ValueHook for Recorder {
    fn on_value(&mut self, site: &HookSite, value: Value) -> Result<Value, HookFault> {
        Ok(self.observe(site, value)?)
    }
}
