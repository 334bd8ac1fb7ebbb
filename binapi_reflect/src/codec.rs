/* Runtime size/encode/decode walks over resolved field plans */

use crate::errors::{CodecError, CodecResult};
use crate::union::UnionCodec;
use crate::value::{StructValue, UnionValue, Value};
use crate::wire::{Reader, Writer};
use binapi_gen::schema::{
    FieldRole, FieldShape, ResolvedEnum, ResolvedField, ResolvedMessage, ResolvedModule,
    ResolvedType, StringKind,
};
use binapi_types::BaseType;
use indexmap::IndexMap;
use tracing::{debug, trace};

/* Something the codec can size, encode and decode by name */
#[derive(Debug, Clone)]
pub enum Target {
    /* Values are structs of the retained fields */
    Message(ResolvedMessage),
    Type(ResolvedType),
}

impl Target {
    pub fn name(&self) -> String {
        match self {
            Target::Message(msg) => msg.name.clone(),
            Target::Type(ty) => ty.type_name(),
        }
    }

    pub fn static_size(&self) -> Option<usize> {
        match self {
            Target::Message(msg) => msg.static_size(),
            Target::Type(ty) => ty.static_size(),
        }
    }

    /* Field list walked for values of this target, for messages and structs */
    pub fn fields(&self) -> Option<&[ResolvedField]> {
        match self {
            Target::Message(msg) => Some(&msg.fields),
            Target::Type(ResolvedType::Struct(def)) => Some(&def.fields),
            Target::Type(_) => None,
        }
    }
}

pub struct Codec {
    targets: IndexMap<String, Target>,
}

impl Codec {
    pub fn new(module: &ResolvedModule) -> Self {
        Self::from_modules([module])
    }

    /* Register every message and named type; messages win over same-named types */
    pub fn from_modules<'m>(modules: impl IntoIterator<Item = &'m ResolvedModule>) -> Self {
        let mut targets = IndexMap::new();
        for module in modules {
            for msg in &module.messages {
                targets.insert(msg.name.clone(), Target::Message(msg.clone()));
            }
            let types = module
                .enums
                .iter()
                .map(|d| ResolvedType::Enum(d.clone()))
                .chain(module.aliases.iter().map(|d| ResolvedType::Alias(d.clone())))
                .chain(module.structs.iter().map(|d| ResolvedType::Struct(d.clone())))
                .chain(module.unions.iter().map(|d| ResolvedType::Union(d.clone())));
            for ty in types {
                targets.entry(ty.type_name()).or_insert(Target::Type(ty));
            }
        }
        debug!(targets = targets.len(), "codec ready");
        Codec { targets }
    }

    pub fn target(&self, name: &str) -> CodecResult<&Target> {
        self.targets.get(name).ok_or_else(|| CodecError::UnknownTarget {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Exact wire size of `value`, validating its shape against the plan.
    pub fn size(&self, name: &str, value: &Value) -> CodecResult<usize> {
        match self.target(name)? {
            Target::Message(msg) => size_fields(&msg.fields, expect_struct(value, name)?, name),
            Target::Type(ty) => size_value(ty, value, name),
        }
    }

    /// Encode into a new buffer of exactly `size` bytes.
    pub fn encode(&self, name: &str, value: &Value) -> CodecResult<Vec<u8>> {
        let required = self.size(name, value)?;
        let mut buf = vec![0u8; required];
        self.encode_sized(name, value, &mut buf)?;
        Ok(buf)
    }

    /// Encode into the front of `buf`; returns the number of bytes written.
    pub fn encode_into(&self, name: &str, value: &Value, buf: &mut [u8]) -> CodecResult<usize> {
        let required = self.size(name, value)?;
        if buf.len() < required {
            return Err(CodecError::BufferTooSmall {
                required,
                available: buf.len(),
            });
        }
        self.encode_sized(name, value, &mut buf[..required])
    }

    fn encode_sized(&self, name: &str, value: &Value, buf: &mut [u8]) -> CodecResult<usize> {
        let mut w = Writer::new(buf);
        match self.target(name)? {
            Target::Message(msg) => {
                encode_fields(&msg.fields, expect_struct(value, name)?, &mut w, name)?
            }
            Target::Type(ty) => encode_value(ty, value, &mut w, name)?,
        }
        trace!(target_name = name, bytes = w.position(), "encoded");
        Ok(w.position())
    }

    pub fn decode(&self, name: &str, bytes: &[u8]) -> CodecResult<Value> {
        Ok(self.decode_with_len(name, bytes)?.0)
    }

    /// Decode from the front of `bytes`; also returns the bytes consumed.
    pub fn decode_with_len(&self, name: &str, bytes: &[u8]) -> CodecResult<(Value, usize)> {
        let mut r = Reader::new(bytes);
        let value = match self.target(name)? {
            Target::Message(msg) => Value::Struct(decode_fields(&msg.fields, &mut r, name)?),
            Target::Type(ty) => decode_value(ty, &mut r, name)?,
        };
        if r.remaining() > 0 {
            trace!(target_name = name, trailing = r.remaining(), "ignoring trailing bytes");
        }
        Ok((value, r.position()))
    }

    pub fn union_codec(&self, name: &str) -> CodecResult<UnionCodec> {
        match self.target(name)? {
            Target::Type(ResolvedType::Union(def)) => Ok(UnionCodec::new(def.clone())),
            other => Err(CodecError::TypeMismatch {
                path: name.to_string(),
                expected: "union".to_string(),
                found: other.name(),
            }),
        }
    }
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn mismatch(path: &str, expected: impl Into<String>, value: &Value) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.into(),
        found: value.kind_name().to_string(),
    }
}

fn expect_struct<'v>(value: &'v Value, path: &str) -> CodecResult<&'v StructValue> {
    value.as_struct().ok_or_else(|| mismatch(path, "struct", value))
}

fn expect_array<'v>(value: &'v Value, path: &str) -> CodecResult<&'v [Value]> {
    value.as_array().ok_or_else(|| mismatch(path, "array", value))
}

fn expect_str<'v>(value: &'v Value, path: &str) -> CodecResult<&'v str> {
    value.as_str().ok_or_else(|| mismatch(path, "string", value))
}

fn expect_union<'v>(value: &'v Value, size: usize, path: &str) -> CodecResult<&'v UnionValue> {
    let union = value.as_union().ok_or_else(|| mismatch(path, "union", value))?;
    if union.data.len() != size {
        return Err(CodecError::UnionSize {
            path: path.to_string(),
            expected: size,
            found: union.data.len(),
        });
    }
    Ok(union)
}

/* Non-string base types always have a wire size */
fn base_size(base: BaseType) -> usize {
    base.wire_size().unwrap_or(0)
}

fn integer_for(base: BaseType, value: &Value, path: &str) -> CodecResult<i128> {
    let n = value
        .as_integer()
        .ok_or_else(|| mismatch(path, base.name(), value))?;
    if Value::from_integer(base, n).is_none() {
        return Err(CodecError::OutOfRange {
            path: path.to_string(),
            value: n.to_string(),
            base,
        });
    }
    Ok(n)
}

fn float_for(value: &Value, path: &str) -> CodecResult<f64> {
    match value {
        Value::F64(v) => Ok(*v),
        other => other
            .as_integer()
            .map(|n| n as f64)
            .ok_or_else(|| mismatch(path, "f64", value)),
    }
}

fn bool_for(value: &Value, path: &str) -> CodecResult<bool> {
    match value {
        Value::Bool(v) => Ok(*v),
        _ => Err(mismatch(path, "bool", value)),
    }
}

/* Enum values wrap into the base type the same way generated constants do */
fn enum_integer(def: &ResolvedEnum, value: &Value, path: &str) -> CodecResult<i128> {
    if let Value::Enum(e) = value {
        if e.type_name != def.name {
            return Err(mismatch(path, format!("enum {}", def.name), value));
        }
    }
    value
        .as_integer()
        .ok_or_else(|| mismatch(path, format!("enum {}", def.name), value))
}

fn validate_base(base: BaseType, value: &Value, path: &str) -> CodecResult<()> {
    match base {
        BaseType::F64 => float_for(value, path).map(|_| ()),
        BaseType::Bool => bool_for(value, path).map(|_| ()),
        BaseType::String => expect_str(value, path).map(|_| ()),
        _ => integer_for(base, value, path).map(|_| ()),
    }
}

fn put_integer(w: &mut Writer<'_>, base: BaseType, n: i128) -> CodecResult<()> {
    match base_size(base) {
        1 => w.put_u8(n as u8),
        2 => w.put_u16(n as u16),
        4 => w.put_u32(n as u32),
        _ => w.put_u64(n as u64),
    }
}

fn put_base(w: &mut Writer<'_>, base: BaseType, value: &Value, path: &str) -> CodecResult<()> {
    match base {
        BaseType::F64 => w.put_f64(float_for(value, path)?),
        BaseType::Bool => w.put_u8(bool_for(value, path)? as u8),
        BaseType::String => w.put_string(expect_str(value, path)?),
        _ => put_integer(w, base, integer_for(base, value, path)?),
    }
}

/* Sign-extended numeric value of an integer base */
fn get_integer(r: &mut Reader<'_>, base: BaseType) -> CodecResult<i128> {
    let n = match base {
        BaseType::I8 => r.get_u8()? as i8 as i128,
        BaseType::U8 => r.get_u8()? as i128,
        BaseType::I16 => r.get_u16()? as i16 as i128,
        BaseType::U16 => r.get_u16()? as i128,
        BaseType::I32 => r.get_u32()? as i32 as i128,
        BaseType::U32 => r.get_u32()? as i128,
        BaseType::I64 => r.get_u64()? as i64 as i128,
        _ => r.get_u64()? as i128,
    };
    Ok(n)
}

fn get_base(r: &mut Reader<'_>, base: BaseType) -> CodecResult<Value> {
    let value = match base {
        BaseType::I8 => Value::I8(r.get_u8()? as i8),
        BaseType::U8 => Value::U8(r.get_u8()?),
        BaseType::I16 => Value::I16(r.get_u16()? as i16),
        BaseType::U16 => Value::U16(r.get_u16()?),
        BaseType::I32 => Value::I32(r.get_u32()? as i32),
        BaseType::U32 => Value::U32(r.get_u32()?),
        BaseType::I64 => Value::I64(r.get_u64()? as i64),
        BaseType::U64 => Value::U64(r.get_u64()?),
        BaseType::F64 => Value::F64(r.get_f64()?),
        BaseType::Bool => Value::Bool(r.get_u8()? != 0),
        BaseType::String => Value::String(r.get_string()?),
    };
    Ok(value)
}

/// Zero value of a type: what a freshly defaulted generated struct holds.
pub fn zero_value(ty: &ResolvedType) -> Value {
    match ty {
        ResolvedType::Base(base) => match base {
            BaseType::F64 => Value::F64(0.0),
            BaseType::Bool => Value::Bool(false),
            BaseType::String => Value::String(String::new()),
            _ => Value::from_integer(*base, 0).unwrap_or(Value::U8(0)),
        },
        ResolvedType::String(_) => Value::String(String::new()),
        ResolvedType::Enum(def) => Value::enum_value(def.name.clone(), 0),
        ResolvedType::Alias(alias) if alias.length > 0 => {
            Value::Array(vec![zero_value(&alias.inner); alias.length])
        }
        ResolvedType::Alias(alias) => zero_value(&alias.inner),
        ResolvedType::Struct(def) => Value::Struct(zero_fields(&def.fields)),
        ResolvedType::Union(def) => Value::Union(UnionValue::zeroed(def.size)),
    }
}

pub fn zero_field(field: &ResolvedField) -> Value {
    match &field.shape {
        FieldShape::Scalar => zero_value(&field.ty),
        FieldShape::Fixed(len) => Value::Array(vec![zero_value(&field.ty); *len]),
        FieldShape::Counted { .. } => Value::Array(Vec::new()),
    }
}

pub fn zero_fields(fields: &[ResolvedField]) -> StructValue {
    let mut value = StructValue::new();
    for field in fields.iter().filter(|f| f.is_encoded()) {
        value.insert(field.name.clone(), zero_field(field));
    }
    value
}

/* Size */

pub(crate) fn size_fields(
    fields: &[ResolvedField],
    value: &StructValue,
    path: &str,
) -> CodecResult<usize> {
    let mut size = 0;
    for field in fields.iter().filter(|f| f.is_encoded()) {
        let field_path = join_path(path, &field.name);

        /* Count fields may be omitted: the array length is what gets written */
        if let FieldRole::CountOf(array) = &field.role {
            let base = field
                .ty
                .integer_base()
                .ok_or_else(|| CodecError::TypeMismatch {
                    path: field_path.clone(),
                    expected: "integer".to_string(),
                    found: field.ty.type_name(),
                })?;
            let count = value.get(array).and_then(Value::as_array).map_or(0, <[Value]>::len);
            if Value::from_integer(base, count as i128).is_none() {
                return Err(CodecError::OutOfRange {
                    path: field_path,
                    value: count.to_string(),
                    base,
                });
            }
            size += base_size(base);
            continue;
        }

        let item = value
            .get(&field.name)
            .ok_or_else(|| CodecError::MissingField {
                path: field_path.clone(),
            })?;
        size += size_field(field, item, &field_path)?;
    }
    Ok(size)
}

pub(crate) fn size_field(field: &ResolvedField, value: &Value, path: &str) -> CodecResult<usize> {
    match &field.shape {
        FieldShape::Scalar => size_value(&field.ty, value, path),
        FieldShape::Fixed(len) => size_fixed(&field.ty, *len, value, path),
        FieldShape::Counted { .. } => {
            let mut size = 0;
            for (i, item) in expect_array(value, path)?.iter().enumerate() {
                size += size_value(&field.ty, item, &index_path(path, i))?;
            }
            Ok(size)
        }
    }
}

/* Missing trailing elements count as zero values, extra ones are ignored */
fn size_fixed(ty: &ResolvedType, len: usize, value: &Value, path: &str) -> CodecResult<usize> {
    let items = expect_array(value, path)?;
    let mut size = 0;
    for i in 0..len {
        size += match items.get(i) {
            Some(item) => size_value(ty, item, &index_path(path, i))?,
            None => size_value(ty, &zero_value(ty), &index_path(path, i))?,
        };
    }
    Ok(size)
}

pub(crate) fn size_value(ty: &ResolvedType, value: &Value, path: &str) -> CodecResult<usize> {
    match ty {
        ResolvedType::Base(base) => {
            validate_base(*base, value, path)?;
            match base {
                BaseType::String => Ok(4 + expect_str(value, path)?.len()),
                _ => Ok(base_size(*base)),
            }
        }
        ResolvedType::String(StringKind::Fixed(len)) => {
            expect_str(value, path)?;
            Ok(*len)
        }
        ResolvedType::String(StringKind::Variable) => Ok(4 + expect_str(value, path)?.len()),
        ResolvedType::Enum(def) => {
            enum_integer(def, value, path)?;
            Ok(base_size(def.base))
        }
        ResolvedType::Alias(alias) if alias.length > 0 => {
            size_fixed(&alias.inner, alias.length, value, path)
        }
        ResolvedType::Alias(alias) => size_value(&alias.inner, value, path),
        ResolvedType::Struct(def) => size_fields(&def.fields, expect_struct(value, path)?, path),
        ResolvedType::Union(def) => {
            expect_union(value, def.size, path)?;
            Ok(def.size)
        }
    }
}

/* Encode */

pub(crate) fn encode_fields(
    fields: &[ResolvedField],
    value: &StructValue,
    w: &mut Writer<'_>,
    path: &str,
) -> CodecResult<()> {
    for field in fields.iter().filter(|f| f.is_encoded()) {
        let field_path = join_path(path, &field.name);

        if let FieldRole::CountOf(array) = &field.role {
            let count = value.get(array).and_then(Value::as_array).map_or(0, <[Value]>::len);
            let base = field.ty.integer_base().unwrap_or(BaseType::U32);
            put_integer(w, base, count as i128)?;
            continue;
        }

        let item = value
            .get(&field.name)
            .ok_or_else(|| CodecError::MissingField {
                path: field_path.clone(),
            })?;
        encode_field(field, item, w, &field_path)?;
    }
    Ok(())
}

pub(crate) fn encode_field(
    field: &ResolvedField,
    value: &Value,
    w: &mut Writer<'_>,
    path: &str,
) -> CodecResult<()> {
    match &field.shape {
        FieldShape::Scalar => encode_value(&field.ty, value, w, path),
        FieldShape::Fixed(len) => encode_fixed(&field.ty, *len, value, w, path),
        FieldShape::Counted { .. } => {
            for (i, item) in expect_array(value, path)?.iter().enumerate() {
                encode_value(&field.ty, item, w, &index_path(path, i))?;
            }
            Ok(())
        }
    }
}

fn encode_fixed(
    ty: &ResolvedType,
    len: usize,
    value: &Value,
    w: &mut Writer<'_>,
    path: &str,
) -> CodecResult<()> {
    let items = expect_array(value, path)?;
    for i in 0..len {
        match items.get(i) {
            Some(item) => encode_value(ty, item, w, &index_path(path, i))?,
            None => encode_value(ty, &zero_value(ty), w, &index_path(path, i))?,
        }
    }
    Ok(())
}

fn encode_value(ty: &ResolvedType, value: &Value, w: &mut Writer<'_>, path: &str) -> CodecResult<()> {
    match ty {
        ResolvedType::Base(base) => put_base(w, *base, value, path),
        ResolvedType::String(StringKind::Fixed(len)) => {
            w.put_fixed_string(expect_str(value, path)?, *len)
        }
        ResolvedType::String(StringKind::Variable) => w.put_string(expect_str(value, path)?),
        ResolvedType::Enum(def) => put_integer(w, def.base, enum_integer(def, value, path)?),
        ResolvedType::Alias(alias) if alias.length > 0 => {
            encode_fixed(&alias.inner, alias.length, value, w, path)
        }
        ResolvedType::Alias(alias) => encode_value(&alias.inner, value, w, path),
        ResolvedType::Struct(def) => encode_fields(&def.fields, expect_struct(value, path)?, w, path),
        ResolvedType::Union(def) => w.put_bytes(&expect_union(value, def.size, path)?.data),
    }
}

/* Decode */

/* A count field decodes as a plain scalar and bounds its array, so the two agree */
pub(crate) fn decode_fields(
    fields: &[ResolvedField],
    r: &mut Reader<'_>,
    path: &str,
) -> CodecResult<StructValue> {
    let mut value = StructValue::new();
    for field in fields.iter().filter(|f| f.is_encoded()) {
        let field_path = join_path(path, &field.name);
        let item = decode_field(field, &value, r, &field_path)?;
        value.insert(field.name.clone(), item);
    }
    Ok(value)
}

/* `siblings` holds the fields decoded so far at this level */
pub(crate) fn decode_field(
    field: &ResolvedField,
    siblings: &StructValue,
    r: &mut Reader<'_>,
    path: &str,
) -> CodecResult<Value> {
    match &field.shape {
        FieldShape::Scalar => decode_value(&field.ty, r, path),
        FieldShape::Fixed(len) => decode_fixed(&field.ty, *len, r, path),
        FieldShape::Counted { count_field } => {
            let count = siblings
                .get(count_field)
                .and_then(Value::as_integer)
                .unwrap_or(0)
                .max(0) as usize;
            let mut items = Vec::with_capacity(count.min(r.remaining()));
            for i in 0..count {
                items.push(decode_value(&field.ty, r, &index_path(path, i))?);
            }
            Ok(Value::Array(items))
        }
    }
}

fn decode_fixed(ty: &ResolvedType, len: usize, r: &mut Reader<'_>, path: &str) -> CodecResult<Value> {
    let mut items = Vec::with_capacity(len.min(r.remaining()));
    for i in 0..len {
        items.push(decode_value(ty, r, &index_path(path, i))?);
    }
    Ok(Value::Array(items))
}

fn decode_value(ty: &ResolvedType, r: &mut Reader<'_>, path: &str) -> CodecResult<Value> {
    match ty {
        ResolvedType::Base(base) => get_base(r, *base),
        ResolvedType::String(StringKind::Fixed(len)) => Ok(Value::String(r.get_fixed_string(*len)?)),
        ResolvedType::String(StringKind::Variable) => Ok(Value::String(r.get_string()?)),
        ResolvedType::Enum(def) => {
            let n = get_integer(r, def.base)?;
            Ok(Value::enum_value(def.name.clone(), n as i64))
        }
        ResolvedType::Alias(alias) if alias.length > 0 => {
            decode_fixed(&alias.inner, alias.length, r, path)
        }
        ResolvedType::Alias(alias) => decode_value(&alias.inner, r, path),
        ResolvedType::Struct(def) => Ok(Value::Struct(decode_fields(&def.fields, r, path)?)),
        ResolvedType::Union(def) => Ok(Value::Union(UnionValue {
            data: r.take(def.size)?.to_vec(),
        })),
    }
}
