//! Hook insertion
//!
//! After every site instruction the rewriter inserts
//!
//! ```text
//! [Box ty] LoadString doc, LoadInt32 start_line, LoadInt32 end_line,
//! LoadInt32 start_col, LoadInt32 end_col, LoadInt64 site_id, CallHook ty [Unbox ty]
//! ```
//!
//! Box/Unbox only surround value types. Every inserted instruction carries
//! the hidden location, so location resolution and debuggers skip it. The
//! sequence pops what it pushes: the stack depth at every original
//! instruction is unchanged.

use bytecode_system::{Instruction, MethodEditor, MethodId, Opcode, SiteRecord};
use core_types::{SourceLocation, ValueType};
use tracing::debug;

use crate::classifier::{classify, Classification, FieldTypes};
use crate::error::RewriteError;

/// Hands out site ids in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteIdAllocator {
    next: u32,
}

impl SiteIdAllocator {
    /// Start allocating at `first`
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Start after the largest id already in use
    pub fn after(max_used: Option<u32>) -> Self {
        Self::starting_at(max_used.map_or(0, |id| id + 1))
    }

    /// Next id
    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Id the next call to [`SiteIdAllocator::allocate`] returns
    pub fn peek(&self) -> u32 {
        self.next
    }
}

struct PlannedSite {
    index: usize,
    record: SiteRecord,
    sequence: Vec<Instruction>,
}

/// Instrument every method body reachable through `editor`.
///
/// Sites are numbered in program order (methods in declaration order,
/// instructions ascending). Returns the site records in id order.
pub fn instrument<E: MethodEditor + ?Sized>(
    editor: &mut E,
    fields: &dyn FieldTypes,
    ids: &mut SiteIdAllocator,
) -> Result<Vec<SiteRecord>, RewriteError> {
    let mut records = Vec::new();
    for method in editor.methods() {
        if !editor.has_body(method) {
            continue;
        }
        let planned = plan_method(editor, method, fields, ids)?;
        // back to front so planned indices stay valid
        for site in planned.iter().rev() {
            editor.insert_after(method, site.index, site.sequence.clone());
        }
        records.extend(planned.into_iter().map(|site| site.record));
    }
    Ok(records)
}

fn plan_method<E: MethodEditor + ?Sized>(
    editor: &E,
    method: MethodId,
    fields: &dyn FieldTypes,
    ids: &mut SiteIdAllocator,
) -> Result<Vec<PlannedSite>, RewriteError> {
    let def = editor.method(method);
    let mut planned = Vec::new();
    for (index, inst) in editor.instructions(method).iter().enumerate() {
        let Classification::Site(ty) = classify(def, index, &inst.opcode, fields)? else {
            continue;
        };
        let location = editor
            .location(method, index)
            .cloned()
            .ok_or_else(|| RewriteError::NoLocation {
                method: def.qualified_name(),
                index,
            })?;
        let id = ids.allocate();
        debug!(
            site = id,
            method = %def.qualified_name(),
            index,
            ty = %ty,
            location = %location,
            "instrumenting site"
        );
        let record = SiteRecord {
            id,
            ty,
            location,
            method: def.qualified_name(),
        };
        planned.push(PlannedSite {
            index,
            sequence: hook_sequence(&record)?,
            record,
        });
    }
    Ok(planned)
}

/// Instructions inserted after a site. Fails when a line or column is
/// beyond `i32::MAX`.
pub fn hook_sequence(site: &SiteRecord) -> Result<Vec<Instruction>, RewriteError> {
    let SourceLocation {
        document,
        start_line,
        end_line,
        start_column,
        end_column,
    } = &site.location;
    let boxed = site.ty.is_value_type();

    let mut ops = Vec::with_capacity(9);
    if boxed {
        ops.push(Opcode::Box(site.ty.clone()));
    }
    ops.push(Opcode::LoadString(document.clone()));
    for n in [start_line, end_line, start_column, end_column] {
        ops.push(Opcode::LoadInt32(literal(site.id, *n)?));
    }
    ops.push(Opcode::LoadInt64(i64::from(site.id)));
    ops.push(Opcode::CallHook(site.ty.clone()));
    if boxed {
        ops.push(Opcode::Unbox(site.ty.clone()));
    }
    Ok(ops
        .into_iter()
        .map(|op| Instruction::hidden(op, document))
        .collect())
}

fn literal(site: u32, value: u32) -> Result<i32, RewriteError> {
    i32::try_from(value).map_err(|_| RewriteError::LocationOutOfRange { site, value })
}

/// Number of instructions [`hook_sequence`] emits for a site of type `ty`
pub fn hook_sequence_len(ty: &ValueType) -> usize {
    if ty.is_value_type() {
        9
    } else {
        7
    }
}
