//! Per-test value profiles
//!
//! A profile is the ordered list of values one test run observed. Each
//! observation carries an occurrence ordinal: the number of earlier
//! observations at the same site within the same run.

use core_types::{Value, ValueType};
use std::collections::HashMap;

/// One value observed at a site
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Site id
    pub site: u32,
    /// Occurrence of the site within the run, starting at 0
    pub ordinal: u32,
    /// Observed value
    pub value: Value,
    /// Declared type of the site
    pub ty: ValueType,
}

/// Values observed during one test run, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueProfile {
    test: String,
    observations: Vec<Observation>,
    occurrences: HashMap<u32, u32>,
}

impl ValueProfile {
    /// Empty profile for `test`
    pub fn new(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            ..Self::default()
        }
    }

    /// Test the profile belongs to
    pub fn test(&self) -> &str {
        &self.test
    }

    /// Append an observation and return its ordinal
    pub fn record(&mut self, site: u32, ty: ValueType, value: Value) -> u32 {
        let count = self.occurrences.entry(site).or_insert(0);
        let ordinal = *count;
        *count += 1;
        self.observations.push(Observation {
            site,
            ordinal,
            value,
            ty,
        });
        ordinal
    }

    /// All observations in execution order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether nothing was observed
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sites touched, in order of first occurrence
    pub fn sites(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for obs in &self.observations {
            if !seen.contains(&obs.site) {
                seen.push(obs.site);
            }
        }
        seen
    }

    /// First observation at `site`
    pub fn first(&self, site: u32) -> Option<&Observation> {
        self.observations.iter().find(|o| o.site == site)
    }

    /// Value of the `ordinal`-th occurrence of `site`
    pub fn value(&self, site: u32, ordinal: u32) -> Option<&Value> {
        self.observations
            .iter()
            .find(|o| o.site == site && o.ordinal == ordinal)
            .map(|o| &o.value)
    }

    /// Values observed at `site`, in execution order
    pub fn values_at(&self, site: u32) -> impl Iterator<Item = &Value> + '_ {
        self.observations
            .iter()
            .filter(move |o| o.site == site)
            .map(|o| &o.value)
    }

    /// Number of times `site` was reached
    pub fn occurrences(&self, site: u32) -> u32 {
        self.occurrences.get(&site).copied().unwrap_or(0)
    }
}
