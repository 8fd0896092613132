//! Recorder errors

use core_types::ValueType;
use thiserror::Error;

/// Failures raised by the hook or while installing overrides
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// A hook call arrived while no test was running
    #[error("site {site} reached outside of a test")]
    NoCurrentTest {
        /// Site id of the call
        site: u32,
    },
    /// The site id is not in the loaded site table
    #[error("unknown site {0}")]
    UnknownSite(u32),
    /// The hooked type disagrees with the site table
    #[error("site {site} is declared {declared} but was hooked as {hooked}")]
    SiteType {
        /// Site id
        site: u32,
        /// Type recorded in the symbol file
        declared: ValueType,
        /// Type operand of the hook call
        hooked: ValueType,
    },
    /// The observed value does not fit the site's declared type
    #[error("site {site} is declared {expected} but observed {found}")]
    ValueType {
        /// Site id
        site: u32,
        /// Declared type of the site
        expected: ValueType,
        /// Description of the observed value
        found: String,
    },
    /// The override cannot be stored in the site's declared type
    #[error("override for site {site} must be {expected}, found {found}")]
    OverrideType {
        /// Site id
        site: u32,
        /// Declared type of the site
        expected: ValueType,
        /// Description of the rejected value
        found: String,
    },
}
