//! A set of modules loaded for execution.

use bytecode_system::{ClassDef, FieldDef, FieldRef, MethodDef, MethodRef, Module};
use std::collections::HashMap;

use crate::error::RuntimeError;

/// Modules linked together so calls, classes and fields resolve across them
#[derive(Debug, Clone)]
pub struct Program {
    modules: Vec<Module>,
    methods: HashMap<MethodRef, (usize, usize)>,
    classes: HashMap<String, (usize, usize)>,
}

impl Program {
    /// Link `modules`. Method references must be unique across modules.
    pub fn new(modules: Vec<Module>) -> Result<Self, RuntimeError> {
        let mut methods = HashMap::new();
        let mut classes = HashMap::new();
        for (mi, module) in modules.iter().enumerate() {
            for (ci, class) in module.classes.iter().enumerate() {
                classes.entry(class.name.clone()).or_insert((mi, ci));
            }
            for (fi, method) in module.methods.iter().enumerate() {
                if methods.insert(method.method_ref(), (mi, fi)).is_some() {
                    return Err(RuntimeError::DuplicateMethod(method.qualified_name()));
                }
            }
        }
        Ok(Self {
            modules,
            methods,
            classes,
        })
    }

    /// Loaded modules, in load order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Module by logical name
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Resolve a method reference
    pub fn method(&self, method: &MethodRef) -> Result<&MethodDef, RuntimeError> {
        self.methods
            .get(method)
            .map(|&(mi, fi)| &self.modules[mi].methods[fi])
            .ok_or_else(|| RuntimeError::UnknownMethod(method.to_string()))
    }

    /// Resolve a class by name
    pub fn class(&self, name: &str) -> Result<&ClassDef, RuntimeError> {
        self.classes
            .get(name)
            .map(|&(mi, ci)| &self.modules[mi].classes[ci])
            .ok_or_else(|| RuntimeError::UnknownClass(name.to_string()))
    }

    /// Resolve a field reference
    pub fn field(&self, field: &FieldRef) -> Result<&FieldDef, RuntimeError> {
        self.class(&field.class)?
            .field(&field.name)
            .ok_or_else(|| RuntimeError::UnknownField(field.to_string()))
    }
}
