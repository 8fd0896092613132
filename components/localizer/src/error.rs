//! Search driver errors

use interpreter::RuntimeError;
use thiserror::Error;

/// Fatal localization failures. Unstable trials are not errors; they are
/// counted as inconclusive.
#[derive(Debug, Error)]
pub enum LocalizeError {
    /// The modules could not be linked
    #[error("failed to load modules: {0}")]
    Load(#[from] RuntimeError),
    /// No loaded module has the given name
    #[error("test module {0} is not loaded")]
    UnknownTestModule(String),
    /// `search` was called before `run_baseline`
    #[error("no baseline has been recorded")]
    NoBaseline,
    /// The test filter is not a valid regular expression
    #[error("invalid test filter: {0}")]
    Filter(#[from] regex::Error),
}
