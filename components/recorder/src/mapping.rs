//! Active value overrides

use core_types::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::HookError;
use crate::sites::SiteTable;

/// Site id to override value.
///
/// Every installed value has been checked against the site's declared type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionMapping {
    overrides: BTreeMap<u32, Value>,
}

impl SubstitutionMapping {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `value` as the override for `site`
    pub fn install(&mut self, sites: &SiteTable, site: u32, value: Value) -> Result<(), HookError> {
        let record = sites.get(site).ok_or(HookError::UnknownSite(site))?;
        if !value.is_assignable_to(&record.ty) {
            return Err(HookError::OverrideType {
                site,
                expected: record.ty.clone(),
                found: value.describe(),
            });
        }
        debug!(site, value = %value, "installing override");
        self.overrides.insert(site, value);
        Ok(())
    }

    /// Remove the override for `site`, returning it
    pub fn uninstall(&mut self, site: u32) -> Option<Value> {
        self.overrides.remove(&site)
    }

    /// Remove every override
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    /// Override for `site`
    pub fn get(&self, site: u32) -> Option<&Value> {
        self.overrides.get(&site)
    }

    /// Number of overrides
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether no override is installed
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
