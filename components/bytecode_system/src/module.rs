//! Compiled module: classes, methods and build metadata.

use core_types::{SourceLocation, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::instruction::Instruction;
use crate::opcode::{FieldRef, MethodRef, Opcode};

/// Debug information level a module was compiled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugInfo {
    /// No symbols emitted
    None,
    /// Symbols emitted for an optimized build only
    SymbolsOnly,
    /// Full debug information
    Full,
}

/// Build configuration recorded in the module header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// Whether the compiler optimized method bodies
    pub optimized: bool,
    /// Debug information level
    pub debug_info: DebugInfo,
}

impl BuildInfo {
    /// Unoptimized build with full debug information
    pub fn debug() -> Self {
        Self {
            optimized: false,
            debug_info: DebugInfo::Full,
        }
    }

    /// Optimized build without symbols
    pub fn release() -> Self {
        Self {
            optimized: true,
            debug_info: DebugInfo::None,
        }
    }

    /// Whether stack shapes and source locations can be trusted
    pub fn is_instrumentable(&self) -> bool {
        !self.optimized && self.debug_info == DebugInfo::Full
    }
}

/// A field declared by a class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: ValueType,
    /// Static (per class) rather than per instance
    pub is_static: bool,
}

/// A class declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class name, unique across all loaded modules
    pub name: String,
    /// Declared fields
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    /// Create a class without fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add an instance field
    pub fn with_field(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
            is_static: false,
        });
        self
    }

    /// Add a static field
    pub fn with_static_field(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            ty,
            is_static: true,
        });
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// What an argument index refers to
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSlot<'a> {
    /// The receiver of an instance method
    This(&'a str),
    /// A declared parameter
    Param(&'a ValueType),
}

/// A method declaration, optionally with a body
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Declaring class
    pub class: String,
    /// Method name
    pub name: String,
    /// Static methods have no receiver
    pub is_static: bool,
    /// Declared parameter types, excluding the receiver
    pub params: Vec<ValueType>,
    /// Declared local variable types
    pub locals: Vec<ValueType>,
    /// Return type, `None` for void
    pub returns: Option<ValueType>,
    /// Attribute names (for example `Test`)
    pub attributes: Vec<String>,
    /// Instructions; `None` for abstract or external methods
    pub body: Option<Vec<Instruction>>,
}

impl MethodDef {
    /// Create a static void method with an empty body
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            is_static: true,
            params: Vec::new(),
            locals: Vec::new(),
            returns: None,
            attributes: Vec::new(),
            body: Some(Vec::new()),
        }
    }

    /// Make this an instance method
    pub fn instance(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Set the parameter types
    pub fn with_params(mut self, params: Vec<ValueType>) -> Self {
        self.params = params;
        self
    }

    /// Set the local variable types
    pub fn with_locals(mut self, locals: Vec<ValueType>) -> Self {
        self.locals = locals;
        self
    }

    /// Set the return type
    pub fn returning(mut self, ty: ValueType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Drop the body, making the method external
    pub fn external(mut self) -> Self {
        self.body = None;
        self
    }

    /// Emit an instruction without source location
    pub fn emit(&mut self, opcode: Opcode) -> usize {
        self.push(Instruction::new(opcode))
    }

    /// Emit an instruction with source location
    pub fn emit_at(&mut self, opcode: Opcode, location: SourceLocation) -> usize {
        self.push(Instruction::with_location(opcode, location))
    }

    fn push(&mut self, inst: Instruction) -> usize {
        let body = self.body.get_or_insert_with(Vec::new);
        body.push(inst);
        body.len() - 1
    }

    /// Index the next emitted instruction will get
    pub fn next_index(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Patch the branch target of the jump at `index`
    pub fn patch_jump(&mut self, index: usize, target: usize) {
        if let Some(target_slot) = self
            .body
            .as_mut()
            .and_then(|b| b.get_mut(index))
            .and_then(|inst| inst.opcode.branch_target_mut())
        {
            *target_slot = target;
        }
    }

    /// Reference to this method
    pub fn method_ref(&self) -> MethodRef {
        MethodRef::new(self.class.clone(), self.name.clone())
    }

    /// `Class::name`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.class, self.name)
    }

    /// Number of argument slots including the receiver
    pub fn arg_count(&self) -> usize {
        self.params.len() + usize::from(!self.is_static)
    }

    /// Resolve an argument index
    pub fn arg_slot(&self, index: u16) -> Option<ArgSlot<'_>> {
        let index = index as usize;
        if self.is_static {
            return self.params.get(index).map(ArgSlot::Param);
        }
        if index == 0 {
            Some(ArgSlot::This(&self.class))
        } else {
            self.params.get(index - 1).map(ArgSlot::Param)
        }
    }

    /// Whether the method carries the attribute
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    /// Instructions of the body, empty for bodiless methods
    pub fn instructions(&self) -> &[Instruction] {
        self.body.as_deref().unwrap_or(&[])
    }
}

/// An instrumentation site recorded by the rewriter.
///
/// Sites are debug data: they are persisted in the symbol file next to the
/// instruction locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Site id burned into the rewritten binary
    pub id: u32,
    /// Declared type of the observed value
    pub ty: ValueType,
    /// Resolved source location
    pub location: SourceLocation,
    /// `Class::method` enclosing the site
    pub method: String,
}

/// A compiled module
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Logical module name
    pub name: String,
    /// Build configuration
    pub build: BuildInfo,
    /// Free-form metadata attributes
    pub metadata: BTreeMap<String, String>,
    /// Class declarations
    pub classes: Vec<ClassDef>,
    /// Method declarations
    pub methods: Vec<MethodDef>,
    /// Instrumentation sites (persisted in the symbol file)
    pub sites: Vec<SiteRecord>,
}

impl Module {
    /// Create an empty module built in debug configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build: BuildInfo::debug(),
            metadata: BTreeMap::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            sites: Vec::new(),
        }
    }

    /// Add a class declaration and return its index
    pub fn add_class(&mut self, class: ClassDef) -> usize {
        self.classes.push(class);
        self.classes.len() - 1
    }

    /// Add a method and return its index
    pub fn add_method(&mut self, method: MethodDef) -> usize {
        self.methods.push(method);
        self.methods.len() - 1
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Look up a field declaration
    pub fn field(&self, field: &FieldRef) -> Option<&FieldDef> {
        self.class(&field.class)?.field(&field.name)
    }

    /// Look up a method declaration
    pub fn method(&self, method: &MethodRef) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.class == method.class && m.name == method.name)
    }

    /// Metadata value by key
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Total instruction count over all method bodies
    pub fn instruction_count(&self) -> usize {
        self.methods.iter().map(|m| m.instructions().len()).sum()
    }

    /// Largest site id recorded in this module
    pub fn max_site_id(&self) -> Option<u32> {
        self.sites.iter().map(|s| s.id).max()
    }
}
