/* JSON conversion of values, driven by the resolved plan */

use crate::codec::{index_path, join_path, zero_field, Codec, Target};
use crate::errors::{CodecError, CodecResult};
use crate::union::UnionCodec;
use crate::value::{StructValue, UnionValue, Value};
use binapi_gen::schema::{FieldRole, FieldShape, ResolvedField, ResolvedType, ResolvedUnion};
use binapi_types::BaseType;
use serde_json::{Map, Number, Value as Json};
use std::sync::Arc;

impl Codec {
    /// Build a value for `name` from JSON, filling omitted fields.
    pub fn from_json(&self, name: &str, json: &Json) -> CodecResult<Value> {
        match self.target(name)? {
            Target::Message(msg) => Ok(Value::Struct(fields_from_json(&msg.fields, json, name)?)),
            Target::Type(ty) => value_from_json(ty, json, name),
        }
    }

    pub fn to_json(&self, name: &str, value: &Value) -> CodecResult<Json> {
        match self.target(name)? {
            Target::Message(msg) => match value {
                Value::Struct(s) => Ok(fields_to_json(&msg.fields, s)),
                other => Err(CodecError::TypeMismatch {
                    path: name.to_string(),
                    expected: "struct".to_string(),
                    found: other.kind_name().to_string(),
                }),
            },
            Target::Type(ty) => Ok(value_to_json(ty, value)),
        }
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: impl Into<String>, json: &Json) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.into(),
        found: json_kind(json).to_string(),
    }
}

/// Struct value from a JSON object. Omitted fields take the field's
/// metadata default when it has one, otherwise the zero value; omitted
/// count fields stay omitted since the codec derives them.
pub fn fields_from_json(fields: &[ResolvedField], json: &Json, path: &str) -> CodecResult<StructValue> {
    let object = json.as_object().ok_or_else(|| mismatch(path, "object", json))?;
    if let Some(key) = object.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
        return Err(CodecError::UnknownField {
            path: join_path(path, key),
        });
    }

    let mut value = StructValue::new();
    for field in fields.iter().filter(|f| f.is_encoded()) {
        let field_path = join_path(path, &field.name);
        match object.get(&field.name) {
            Some(item) => {
                value.insert(field.name.clone(), field_from_json(field, item, &field_path)?);
            }
            None if matches!(field.role, FieldRole::CountOf(_)) => {}
            None => {
                value.insert(field.name.clone(), default_field(field));
            }
        }
    }
    Ok(value)
}

fn default_field(field: &ResolvedField) -> Value {
    if let (FieldShape::Scalar, Some(default)) = (&field.shape, field.meta.default) {
        if let Some(value) = value_from_default(&field.ty, default) {
            return value;
        }
    }
    zero_field(field)
}

fn value_from_default(ty: &ResolvedType, default: f64) -> Option<Value> {
    match ty {
        ResolvedType::Base(BaseType::F64) => Some(Value::F64(default)),
        ResolvedType::Base(BaseType::Bool) => Some(Value::Bool(default != 0.0)),
        ResolvedType::Base(base) => Value::from_integer(*base, default as i128),
        ResolvedType::Enum(def) => Some(Value::enum_value(def.name.clone(), default as i64)),
        ResolvedType::Alias(alias) if alias.length == 0 => value_from_default(&alias.inner, default),
        _ => None,
    }
}

pub fn field_from_json(field: &ResolvedField, json: &Json, path: &str) -> CodecResult<Value> {
    match &field.shape {
        FieldShape::Scalar => value_from_json(&field.ty, json, path),
        FieldShape::Fixed(_) | FieldShape::Counted { .. } => array_from_json(&field.ty, json, path),
    }
}

fn is_byte(ty: &ResolvedType) -> bool {
    match ty {
        ResolvedType::Base(BaseType::U8) => true,
        ResolvedType::Alias(alias) if alias.length == 0 => is_byte(&alias.inner),
        _ => false,
    }
}

fn hex_bytes(s: &str, path: &str) -> CodecResult<Vec<u8>> {
    hex::decode(s.trim_start_matches("0x")).map_err(|e| CodecError::InvalidJson {
        path: path.to_string(),
        reason: format!("invalid hex string: {}", e),
    })
}

/* Byte arrays also accept a hex string */
fn array_from_json(element: &ResolvedType, json: &Json, path: &str) -> CodecResult<Value> {
    match json {
        Json::String(s) if is_byte(element) => {
            Ok(Value::Array(hex_bytes(s, path)?.into_iter().map(Value::U8).collect()))
        }
        Json::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                values.push(value_from_json(element, item, &index_path(path, i))?);
            }
            Ok(Value::Array(values))
        }
        other => Err(mismatch(path, "array", other)),
    }
}

pub fn value_from_json(ty: &ResolvedType, json: &Json, path: &str) -> CodecResult<Value> {
    match ty {
        ResolvedType::Base(base) => base_from_json(*base, json, path),
        ResolvedType::String(_) => json
            .as_str()
            .map(Value::from)
            .ok_or_else(|| mismatch(path, "string", json)),
        ResolvedType::Enum(def) => match json {
            Json::String(entry) => def
                .entry_value(entry)
                .map(|v| Value::enum_value(def.name.clone(), v))
                .ok_or_else(|| CodecError::UnknownEnumEntry {
                    path: path.to_string(),
                    enum_name: def.name.clone(),
                    entry: entry.clone(),
                }),
            Json::Number(n) => n
                .as_i64()
                .map(|v| Value::enum_value(def.name.clone(), v))
                .ok_or_else(|| mismatch(path, format!("enum {}", def.name), json)),
            other => Err(mismatch(path, format!("enum {}", def.name), other)),
        },
        ResolvedType::Alias(alias) if alias.length > 0 => array_from_json(&alias.inner, json, path),
        ResolvedType::Alias(alias) => value_from_json(&alias.inner, json, path),
        ResolvedType::Struct(def) => Ok(Value::Struct(fields_from_json(&def.fields, json, path)?)),
        ResolvedType::Union(def) => union_from_json(def, json, path),
    }
}

fn base_from_json(base: BaseType, json: &Json, path: &str) -> CodecResult<Value> {
    match base {
        BaseType::Bool => match json {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) if n.as_u64().is_some() => Ok(Value::Bool(n.as_u64() != Some(0))),
            other => Err(mismatch(path, "bool", other)),
        },
        BaseType::F64 => json
            .as_f64()
            .map(Value::F64)
            .ok_or_else(|| mismatch(path, "f64", json)),
        BaseType::String => json
            .as_str()
            .map(Value::from)
            .ok_or_else(|| mismatch(path, "string", json)),
        _ => {
            let n = json
                .as_i64()
                .map(i128::from)
                .or_else(|| json.as_u64().map(i128::from))
                .ok_or_else(|| mismatch(path, base.name(), json))?;
            Value::from_integer(base, n).ok_or_else(|| CodecError::OutOfRange {
                path: path.to_string(),
                value: n.to_string(),
                base,
            })
        }
    }
}

/* A hex string of the raw bytes, or `{ "<member>": value }` */
fn union_from_json(def: &Arc<ResolvedUnion>, json: &Json, path: &str) -> CodecResult<Value> {
    match json {
        Json::String(s) => {
            let data = hex_bytes(s, path)?;
            if data.len() != def.size {
                return Err(CodecError::UnionSize {
                    path: path.to_string(),
                    expected: def.size,
                    found: data.len(),
                });
            }
            Ok(Value::Union(UnionValue { data }))
        }
        Json::Object(object) if object.len() == 1 => {
            let (member, item) = object.iter().next().ok_or_else(|| mismatch(path, "union", json))?;
            let field = def.member(member).ok_or_else(|| CodecError::UnknownMember {
                union: def.name.clone(),
                member: member.clone(),
            })?;
            let value = field_from_json(field, item, &join_path(path, member))?;
            Ok(Value::Union(UnionCodec::new(def.clone()).new_with(member, &value)?))
        }
        other => Err(mismatch(path, "hex string or single-member object", other)),
    }
}

/// JSON object of the encoded fields present in `value`, in plan order.
pub fn fields_to_json(fields: &[ResolvedField], value: &StructValue) -> Json {
    let mut object = Map::new();
    for field in fields.iter().filter(|f| f.is_encoded()) {
        if let Some(item) = value.get(&field.name) {
            object.insert(field.name.clone(), field_to_json(field, item));
        }
    }
    Json::Object(object)
}

fn field_to_json(field: &ResolvedField, value: &Value) -> Json {
    match (&field.shape, value) {
        (FieldShape::Scalar, _) => value_to_json(&field.ty, value),
        (_, Value::Array(items)) => Json::Array(items.iter().map(|v| value_to_json(&field.ty, v)).collect()),
        _ => plain_json(value),
    }
}

/// Enums render as their entry name when the value has one, unions as hex.
pub fn value_to_json(ty: &ResolvedType, value: &Value) -> Json {
    match (ty, value) {
        (ResolvedType::Enum(def), _) => match value.as_integer() {
            Some(n) => match def.entry_name(n as i64) {
                Some(name) => Json::String(name.to_string()),
                None => plain_json(value),
            },
            None => plain_json(value),
        },
        (ResolvedType::Alias(alias), Value::Array(items)) if alias.length > 0 => {
            Json::Array(items.iter().map(|v| value_to_json(&alias.inner, v)).collect())
        }
        (ResolvedType::Alias(alias), _) => value_to_json(&alias.inner, value),
        (ResolvedType::Struct(def), Value::Struct(s)) => fields_to_json(&def.fields, s),
        _ => plain_json(value),
    }
}

/* JSON of a value without plan information */
pub fn plain_json(value: &Value) -> Json {
    match value {
        Value::I8(v) => Json::from(*v),
        Value::U8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::F64(v) => Number::from_f64(*v).map(Json::Number).unwrap_or(Json::Null),
        Value::Bool(v) => Json::Bool(*v),
        Value::String(s) => Json::String(s.clone()),
        Value::Enum(e) => Json::from(e.value),
        Value::Array(items) => Json::Array(items.iter().map(plain_json).collect()),
        Value::Struct(s) => Json::Object(
            s.fields
                .iter()
                .map(|(name, v)| (name.clone(), plain_json(v)))
                .collect(),
        ),
        Value::Union(u) => Json::String(hex::encode(&u.data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values() {
        assert_eq!(plain_json(&Value::U32(7)), serde_json::json!(7));
        assert_eq!(plain_json(&Value::F64(f64::NAN)), Json::Null);
        assert_eq!(
            plain_json(&Value::Union(UnionValue { data: vec![0x0a, 0, 0, 1] })),
            serde_json::json!("0a000001")
        );
    }

    #[test]
    fn integers_from_json_are_range_checked() {
        assert_eq!(base_from_json(BaseType::U8, &serde_json::json!(200), "x"), Ok(Value::U8(200)));
        assert!(matches!(
            base_from_json(BaseType::U8, &serde_json::json!(256), "x"),
            Err(CodecError::OutOfRange { .. })
        ));
        assert_eq!(
            base_from_json(BaseType::U64, &serde_json::json!(u64::MAX), "x"),
            Ok(Value::U64(u64::MAX))
        );
        assert_eq!(base_from_json(BaseType::Bool, &serde_json::json!(1), "x"), Ok(Value::Bool(true)));
    }
}
