/* Dynamic values walked by the codec */

use binapi_types::BaseType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    String(String),
    Enum(EnumValue),
    /* Elements of a fixed or counted array, or of a fixed-array alias */
    Array(Vec<Value>),
    Struct(StructValue),
    Union(UnionValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub value: i64,
}

/* Field values of a struct or message, in declaration order */
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructValue {
    pub fields: IndexMap<String, Value>,
}

/* Raw bytes of a union; length equals the union's wire size */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionValue {
    pub data: Vec<u8>,
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Union(_) => "union",
        }
    }

    pub fn enum_value(type_name: impl Into<String>, value: i64) -> Self {
        Value::Enum(EnumValue {
            type_name: type_name.into(),
            value,
        })
    }

    /// Numeric value of any integer variant or enum.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(*v as i128),
            Value::U8(v) => Some(*v as i128),
            Value::I16(v) => Some(*v as i128),
            Value::U16(v) => Some(*v as i128),
            Value::I32(v) => Some(*v as i128),
            Value::U32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            Value::Enum(e) => Some(e.value as i128),
            _ => None,
        }
    }

    /// Typed integer value of `base`, or None when `n` does not fit.
    pub fn from_integer(base: BaseType, n: i128) -> Option<Self> {
        let value = match base {
            BaseType::I8 => Value::I8(i8::try_from(n).ok()?),
            BaseType::U8 => Value::U8(u8::try_from(n).ok()?),
            BaseType::I16 => Value::I16(i16::try_from(n).ok()?),
            BaseType::U16 => Value::U16(u16::try_from(n).ok()?),
            BaseType::I32 => Value::I32(i32::try_from(n).ok()?),
            BaseType::U32 => Value::U32(u32::try_from(n).ok()?),
            BaseType::I64 => Value::I64(i64::try_from(n).ok()?),
            BaseType::U64 => Value::U64(u64::try_from(n).ok()?),
            BaseType::F64 | BaseType::Bool | BaseType::String => return None,
        };
        Some(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionValue> {
        match self {
            Value::Union(u) => Some(u),
            _ => None,
        }
    }
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /* Builder-style insert */
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl UnionValue {
    pub fn zeroed(size: usize) -> Self {
        UnionValue {
            data: vec![0; size],
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

impl_from! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f64 => F64,
    bool => Bool,
    String => String,
    EnumValue => Enum,
    Vec<Value> => Array,
    StructValue => Struct,
    UnionValue => Union,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
