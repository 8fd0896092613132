//! Site table loaded from rewritten modules

use bytecode_system::{Module, SiteRecord};
use std::collections::BTreeMap;

/// Instrumentation sites by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteTable {
    sites: BTreeMap<u32, SiteRecord>,
}

impl SiteTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the sites of every module
    pub fn from_modules<'a>(modules: impl IntoIterator<Item = &'a Module>) -> Self {
        modules
            .into_iter()
            .flat_map(|m| m.sites.iter().cloned())
            .collect()
    }

    /// Add or replace a site
    pub fn insert(&mut self, site: SiteRecord) {
        self.sites.insert(site.id, site);
    }

    /// Look up a site
    pub fn get(&self, id: u32) -> Option<&SiteRecord> {
        self.sites.get(&id)
    }

    /// Sites in id order
    pub fn iter(&self) -> impl Iterator<Item = &SiteRecord> {
        self.sites.values()
    }

    /// Number of sites
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl FromIterator<SiteRecord> for SiteTable {
    fn from_iter<I: IntoIterator<Item = SiteRecord>>(iter: I) -> Self {
        let mut table = SiteTable::new();
        for site in iter {
            table.insert(site);
        }
        table
    }
}
