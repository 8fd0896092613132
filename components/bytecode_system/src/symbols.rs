//! Companion symbol file
//!
//! Source locations and the instrumentation site table are kept out of the
//! binary and stored as JSON next to it.

use core_types::SourceLocation;
use serde::{Deserialize, Serialize};

use crate::error::ModuleError;
use crate::module::{Module, SiteRecord};

/// Per-instruction locations of one method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSymbols {
    /// `Class::method`
    pub method: String,
    /// One entry per instruction; `None` where the compiler emitted nothing
    pub locations: Vec<Option<SourceLocation>>,
}

/// Contents of a symbol file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFile {
    /// Logical name of the module the symbols belong to
    pub module: String,
    /// Locations for every method with a body, in declaration order
    pub methods: Vec<MethodSymbols>,
    /// Site table written by the rewriter
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
}

impl SymbolFile {
    /// Extract the symbols of a module
    pub fn from_module(module: &Module) -> Self {
        let methods = module
            .methods
            .iter()
            .filter_map(|m| {
                let body = m.body.as_ref()?;
                Some(MethodSymbols {
                    method: m.qualified_name(),
                    locations: body.iter().map(|i| i.location.clone()).collect(),
                })
            })
            .collect();
        Self {
            module: module.name.clone(),
            methods,
            sites: module.sites.clone(),
        }
    }

    /// Attach the symbols to a decoded module.
    ///
    /// Fails when the file names another module, or when a method's location
    /// count disagrees with its instruction count.
    pub fn apply_to(self, module: &mut Module) -> Result<(), ModuleError> {
        if self.module != module.name {
            return Err(ModuleError::SymbolMismatch {
                module: module.name.clone(),
                reason: format!("symbols are for module '{}'", self.module),
            });
        }

        for entry in self.methods {
            let method = module
                .methods
                .iter_mut()
                .find(|m| m.qualified_name() == entry.method)
                .ok_or_else(|| ModuleError::SymbolMismatch {
                    module: self.module.clone(),
                    reason: format!("unknown method {}", entry.method),
                })?;
            let body = method
                .body
                .as_mut()
                .ok_or_else(|| ModuleError::SymbolMismatch {
                    module: self.module.clone(),
                    reason: format!("method {} has no body", entry.method),
                })?;
            if body.len() != entry.locations.len() {
                return Err(ModuleError::SymbolMismatch {
                    module: self.module.clone(),
                    reason: format!(
                        "{} has {} instructions but {} locations",
                        entry.method,
                        body.len(),
                        entry.locations.len()
                    ),
                });
            }
            for (inst, location) in body.iter_mut().zip(entry.locations) {
                inst.location = location;
            }
        }

        module.sites = self.sites;
        Ok(())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
