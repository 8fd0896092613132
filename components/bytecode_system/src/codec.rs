//! Binary module format
//!
//! Layout (all integers little-endian, strings and lists length-prefixed
//! with a `u32`):
//!
//! ```text
//! "IVMB" | version u8 | name | optimized u8 | debug_info u8
//! | metadata: [key, value]* | classes: [name, fields]* | methods: [...]*
//! ```
//!
//! Source locations and instrumentation sites are not part of the binary;
//! they live in the companion symbol file.

use core_types::ValueType;
use std::collections::BTreeMap;

use crate::error::ModuleError;
use crate::instruction::Instruction;
use crate::module::{BuildInfo, ClassDef, DebugInfo, FieldDef, MethodDef, Module};
use crate::opcode::{FieldRef, MethodRef, Opcode};

const MAGIC: &[u8; 4] = b"IVMB";
const FORMAT_VERSION: u8 = 1;

/// Serialize a module to its binary form
pub fn encode_module(module: &Module) -> Vec<u8> {
    let mut w = ByteWriter::default();
    w.bytes.extend_from_slice(MAGIC);
    w.put_u8(FORMAT_VERSION);
    w.put_str(&module.name);
    w.put_bool(module.build.optimized);
    w.put_u8(match module.build.debug_info {
        DebugInfo::None => 0,
        DebugInfo::SymbolsOnly => 1,
        DebugInfo::Full => 2,
    });

    w.put_len(module.metadata.len());
    for (key, value) in &module.metadata {
        w.put_str(key);
        w.put_str(value);
    }

    w.put_len(module.classes.len());
    for class in &module.classes {
        w.put_str(&class.name);
        w.put_len(class.fields.len());
        for field in &class.fields {
            w.put_str(&field.name);
            w.put_type(&field.ty);
            w.put_bool(field.is_static);
        }
    }

    w.put_len(module.methods.len());
    for method in &module.methods {
        encode_method(&mut w, method);
    }

    w.bytes
}

/// Deserialize a module from its binary form
pub fn decode_module(bytes: &[u8]) -> Result<Module, ModuleError> {
    if bytes.len() < MAGIC.len() + 1 {
        return Err(ModuleError::InvalidHeader(
            "too few bytes for module header".to_string(),
        ));
    }
    if &bytes[0..4] != MAGIC {
        return Err(ModuleError::InvalidHeader("invalid magic number".to_string()));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(ModuleError::UnsupportedVersion(bytes[4]));
    }

    let mut r = ByteReader::new(bytes, 5);
    let name = r.str()?;
    let optimized = r.bool()?;
    let debug_offset = r.offset;
    let debug_info = match r.u8()? {
        0 => DebugInfo::None,
        1 => DebugInfo::SymbolsOnly,
        2 => DebugInfo::Full,
        tag => {
            return Err(ModuleError::UnknownTag {
                what: "debug info",
                tag,
                offset: debug_offset,
            })
        }
    };

    let mut metadata = BTreeMap::new();
    for _ in 0..r.len()? {
        let key = r.str()?;
        let value = r.str()?;
        metadata.insert(key, value);
    }

    let class_count = r.count()?;
    let mut classes = Vec::with_capacity(class_count);
    for _ in 0..class_count {
        let name = r.str()?;
        let field_count = r.count()?;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(FieldDef {
                name: r.str()?,
                ty: r.value_type()?,
                is_static: r.bool()?,
            });
        }
        classes.push(ClassDef { name, fields });
    }

    let method_count = r.count()?;
    let mut methods = Vec::with_capacity(method_count);
    for _ in 0..method_count {
        methods.push(decode_method(&mut r)?);
    }

    Ok(Module {
        name,
        build: BuildInfo {
            optimized,
            debug_info,
        },
        metadata,
        classes,
        methods,
        sites: Vec::new(),
    })
}

fn encode_method(w: &mut ByteWriter, method: &MethodDef) {
    w.put_str(&method.class);
    w.put_str(&method.name);
    w.put_bool(method.is_static);
    w.put_len(method.params.len());
    for ty in &method.params {
        w.put_type(ty);
    }
    w.put_len(method.locals.len());
    for ty in &method.locals {
        w.put_type(ty);
    }
    match &method.returns {
        Some(ty) => {
            w.put_u8(1);
            w.put_type(ty);
        }
        None => w.put_u8(0),
    }
    w.put_len(method.attributes.len());
    for attribute in &method.attributes {
        w.put_str(attribute);
    }
    match &method.body {
        Some(body) => {
            w.put_u8(1);
            w.put_len(body.len());
            for inst in body {
                encode_opcode(w, &inst.opcode);
            }
        }
        None => w.put_u8(0),
    }
}

fn decode_method(r: &mut ByteReader<'_>) -> Result<MethodDef, ModuleError> {
    let class = r.str()?;
    let name = r.str()?;
    let is_static = r.bool()?;
    let params = (0..r.len()?)
        .map(|_| r.value_type())
        .collect::<Result<Vec<_>, _>>()?;
    let locals = (0..r.len()?)
        .map(|_| r.value_type())
        .collect::<Result<Vec<_>, _>>()?;
    let returns = if r.bool()? {
        Some(r.value_type()?)
    } else {
        None
    };
    let attributes = (0..r.len()?)
        .map(|_| r.str())
        .collect::<Result<Vec<_>, _>>()?;
    let body = if r.bool()? {
        let count = r.count()?;
        let mut body = Vec::with_capacity(count);
        for _ in 0..count {
            body.push(Instruction::new(decode_opcode(r)?));
        }
        Some(body)
    } else {
        None
    };

    Ok(MethodDef {
        class,
        name,
        is_static,
        params,
        locals,
        returns,
        attributes,
        body,
    })
}

fn encode_opcode(w: &mut ByteWriter, opcode: &Opcode) {
    match opcode {
        Opcode::Nop => w.put_u8(0),
        Opcode::LoadNull => w.put_u8(1),
        Opcode::LoadInt32(n) => {
            w.put_u8(2);
            w.put_i32(*n);
        }
        Opcode::LoadInt64(n) => {
            w.put_u8(3);
            w.put_i64(*n);
        }
        Opcode::LoadFloat64(n) => {
            w.put_u8(4);
            w.put_f64(*n);
        }
        Opcode::LoadBool(b) => {
            w.put_u8(5);
            w.put_bool(*b);
        }
        Opcode::LoadChar(c) => {
            w.put_u8(6);
            w.put_u32(*c as u32);
        }
        Opcode::LoadString(s) => {
            w.put_u8(7);
            w.put_str(s);
        }
        Opcode::LoadLocal(i) => {
            w.put_u8(8);
            w.put_u16(*i);
        }
        Opcode::LoadLocalAddress(i) => {
            w.put_u8(9);
            w.put_u16(*i);
        }
        Opcode::StoreLocal(i) => {
            w.put_u8(10);
            w.put_u16(*i);
        }
        Opcode::LoadArg(i) => {
            w.put_u8(11);
            w.put_u16(*i);
        }
        Opcode::LoadArgAddress(i) => {
            w.put_u8(12);
            w.put_u16(*i);
        }
        Opcode::StoreArg(i) => {
            w.put_u8(13);
            w.put_u16(*i);
        }
        Opcode::LoadField(f) => {
            w.put_u8(14);
            w.put_field(f);
        }
        Opcode::LoadFieldAddress(f) => {
            w.put_u8(15);
            w.put_field(f);
        }
        Opcode::StoreField(f) => {
            w.put_u8(16);
            w.put_field(f);
        }
        Opcode::LoadStaticField(f) => {
            w.put_u8(17);
            w.put_field(f);
        }
        Opcode::LoadStaticFieldAddress(f) => {
            w.put_u8(18);
            w.put_field(f);
        }
        Opcode::StoreStaticField(f) => {
            w.put_u8(19);
            w.put_field(f);
        }
        Opcode::NewArray(ty) => {
            w.put_u8(20);
            w.put_type(ty);
        }
        Opcode::ArrayLength => w.put_u8(21),
        Opcode::LoadElement(ty) => {
            w.put_u8(22);
            w.put_type(ty);
        }
        Opcode::LoadElementAddress(ty) => {
            w.put_u8(23);
            w.put_type(ty);
        }
        Opcode::StoreElement(ty) => {
            w.put_u8(24);
            w.put_type(ty);
        }
        Opcode::LoadIndirect(ty) => {
            w.put_u8(25);
            w.put_type(ty);
        }
        Opcode::StoreIndirect(ty) => {
            w.put_u8(26);
            w.put_type(ty);
        }
        Opcode::LoadObject(ty) => {
            w.put_u8(27);
            w.put_type(ty);
        }
        Opcode::LoadFunction(m) => {
            w.put_u8(28);
            w.put_method(m);
        }
        Opcode::LoadVirtualFunction(m) => {
            w.put_u8(29);
            w.put_method(m);
        }
        Opcode::Dup => w.put_u8(30),
        Opcode::Pop => w.put_u8(31),
        Opcode::Add => w.put_u8(32),
        Opcode::Sub => w.put_u8(33),
        Opcode::Mul => w.put_u8(34),
        Opcode::Div => w.put_u8(35),
        Opcode::Rem => w.put_u8(36),
        Opcode::Neg => w.put_u8(37),
        Opcode::Not => w.put_u8(38),
        Opcode::CompareEqual => w.put_u8(39),
        Opcode::CompareLess => w.put_u8(40),
        Opcode::CompareGreater => w.put_u8(41),
        Opcode::Jump(t) => {
            w.put_u8(42);
            w.put_len(*t);
        }
        Opcode::JumpIfTrue(t) => {
            w.put_u8(43);
            w.put_len(*t);
        }
        Opcode::JumpIfFalse(t) => {
            w.put_u8(44);
            w.put_len(*t);
        }
        Opcode::Return => w.put_u8(45),
        Opcode::Throw => w.put_u8(46),
        Opcode::Call(m) => {
            w.put_u8(47);
            w.put_method(m);
        }
        Opcode::NewObject(class) => {
            w.put_u8(48);
            w.put_str(class);
        }
        Opcode::Box(ty) => {
            w.put_u8(49);
            w.put_type(ty);
        }
        Opcode::Unbox(ty) => {
            w.put_u8(50);
            w.put_type(ty);
        }
        Opcode::CallHook(ty) => {
            w.put_u8(51);
            w.put_type(ty);
        }
    }
}

fn decode_opcode(r: &mut ByteReader<'_>) -> Result<Opcode, ModuleError> {
    let offset = r.offset;
    let tag = r.u8()?;
    let opcode = match tag {
        0 => Opcode::Nop,
        1 => Opcode::LoadNull,
        2 => Opcode::LoadInt32(r.i32()?),
        3 => Opcode::LoadInt64(r.i64()?),
        4 => Opcode::LoadFloat64(r.f64()?),
        5 => Opcode::LoadBool(r.bool()?),
        6 => {
            let raw = r.u32()?;
            Opcode::LoadChar(char::from_u32(raw).ok_or(ModuleError::InvalidChar(raw))?)
        }
        7 => Opcode::LoadString(r.str()?),
        8 => Opcode::LoadLocal(r.u16()?),
        9 => Opcode::LoadLocalAddress(r.u16()?),
        10 => Opcode::StoreLocal(r.u16()?),
        11 => Opcode::LoadArg(r.u16()?),
        12 => Opcode::LoadArgAddress(r.u16()?),
        13 => Opcode::StoreArg(r.u16()?),
        14 => Opcode::LoadField(r.field()?),
        15 => Opcode::LoadFieldAddress(r.field()?),
        16 => Opcode::StoreField(r.field()?),
        17 => Opcode::LoadStaticField(r.field()?),
        18 => Opcode::LoadStaticFieldAddress(r.field()?),
        19 => Opcode::StoreStaticField(r.field()?),
        20 => Opcode::NewArray(r.value_type()?),
        21 => Opcode::ArrayLength,
        22 => Opcode::LoadElement(r.value_type()?),
        23 => Opcode::LoadElementAddress(r.value_type()?),
        24 => Opcode::StoreElement(r.value_type()?),
        25 => Opcode::LoadIndirect(r.value_type()?),
        26 => Opcode::StoreIndirect(r.value_type()?),
        27 => Opcode::LoadObject(r.value_type()?),
        28 => Opcode::LoadFunction(r.method()?),
        29 => Opcode::LoadVirtualFunction(r.method()?),
        30 => Opcode::Dup,
        31 => Opcode::Pop,
        32 => Opcode::Add,
        33 => Opcode::Sub,
        34 => Opcode::Mul,
        35 => Opcode::Div,
        36 => Opcode::Rem,
        37 => Opcode::Neg,
        38 => Opcode::Not,
        39 => Opcode::CompareEqual,
        40 => Opcode::CompareLess,
        41 => Opcode::CompareGreater,
        42 => Opcode::Jump(r.len()?),
        43 => Opcode::JumpIfTrue(r.len()?),
        44 => Opcode::JumpIfFalse(r.len()?),
        45 => Opcode::Return,
        46 => Opcode::Throw,
        47 => Opcode::Call(r.method()?),
        48 => Opcode::NewObject(r.str()?),
        49 => Opcode::Box(r.value_type()?),
        50 => Opcode::Unbox(r.value_type()?),
        51 => Opcode::CallHook(r.value_type()?),
        _ => return Err(ModuleError::UnknownOpcode { tag, offset }),
    };
    Ok(opcode)
}

#[derive(Default)]
struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    fn put_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn put_bool(&mut self, v: bool) {
        self.bytes.push(u8::from(v));
    }

    fn put_u16(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn put_i64(&mut self, v: i64) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f64(&mut self, v: f64) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    fn put_len(&mut self, v: usize) {
        self.put_u32(v as u32);
    }

    fn put_str(&mut self, s: &str) {
        self.put_len(s.len());
        self.bytes.extend_from_slice(s.as_bytes());
    }

    fn put_type(&mut self, ty: &ValueType) {
        match ty {
            ValueType::Int32 => self.put_u8(0),
            ValueType::Int64 => self.put_u8(1),
            ValueType::Float64 => self.put_u8(2),
            ValueType::Bool => self.put_u8(3),
            ValueType::Char => self.put_u8(4),
            ValueType::String => self.put_u8(5),
            ValueType::Object(class) => {
                self.put_u8(6);
                self.put_str(class);
            }
        }
    }

    fn put_field(&mut self, field: &FieldRef) {
        self.put_str(&field.class);
        self.put_str(&field.name);
    }

    fn put_method(&mut self, method: &MethodRef) {
        self.put_str(&method.class);
        self.put_str(&method.name);
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ModuleError> {
        let end = self.offset + N;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(ModuleError::Truncated(self.offset))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.offset = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ModuleError> {
        Ok(self.take::<1>()?[0])
    }

    fn bool(&mut self) -> Result<bool, ModuleError> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> Result<u16, ModuleError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32, ModuleError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, ModuleError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64, ModuleError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> Result<f64, ModuleError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn len(&mut self) -> Result<usize, ModuleError> {
        Ok(self.u32()? as usize)
    }

    /// Element count of a list whose entries take at least one byte each
    fn count(&mut self) -> Result<usize, ModuleError> {
        let offset = self.offset;
        let count = self.len()?;
        if count > self.bytes.len().saturating_sub(self.offset) {
            return Err(ModuleError::Truncated(offset));
        }
        Ok(count)
    }

    fn str(&mut self) -> Result<String, ModuleError> {
        let len = self.len()?;
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(ModuleError::Truncated(self.offset))?;
        self.offset = end;
        Ok(String::from_utf8(slice.to_vec())?)
    }

    fn value_type(&mut self) -> Result<ValueType, ModuleError> {
        let offset = self.offset;
        let ty = match self.u8()? {
            0 => ValueType::Int32,
            1 => ValueType::Int64,
            2 => ValueType::Float64,
            3 => ValueType::Bool,
            4 => ValueType::Char,
            5 => ValueType::String,
            6 => ValueType::Object(self.str()?),
            tag => {
                return Err(ModuleError::UnknownTag {
                    what: "value type",
                    tag,
                    offset,
                })
            }
        };
        Ok(ty)
    }

    fn field(&mut self) -> Result<FieldRef, ModuleError> {
        Ok(FieldRef::new(self.str()?, self.str()?))
    }

    fn method(&mut self) -> Result<MethodRef, ModuleError> {
        Ok(MethodRef::new(self.str()?, self.str()?))
    }
}
