use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Scalar types understood directly by the wire format.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F64,
    Bool,
    String,
}

impl BaseType {
    pub const ALL: [BaseType; 11] = [
        BaseType::I8,
        BaseType::U8,
        BaseType::I16,
        BaseType::U16,
        BaseType::I32,
        BaseType::U32,
        BaseType::I64,
        BaseType::U64,
        BaseType::F64,
        BaseType::Bool,
        BaseType::String,
    ];

    /* Look up a base type by its schema name ("u32", "string", ...) */
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::I8 => "i8",
            BaseType::U8 => "u8",
            BaseType::I16 => "i16",
            BaseType::U16 => "u16",
            BaseType::I32 => "i32",
            BaseType::U32 => "u32",
            BaseType::I64 => "i64",
            BaseType::U64 => "u64",
            BaseType::F64 => "f64",
            BaseType::Bool => "bool",
            BaseType::String => "string",
        }
    }

    /// Number of bytes one value occupies on the wire.
    ///
    /// Strings have no intrinsic size: it comes either from the declared
    /// length of the field or from a 4-byte length prefix at runtime.
    pub fn wire_size(self) -> Option<usize> {
        match self {
            BaseType::I8 | BaseType::U8 | BaseType::Bool => Some(1),
            BaseType::I16 | BaseType::U16 => Some(2),
            BaseType::I32 | BaseType::U32 => Some(4),
            BaseType::I64 | BaseType::U64 | BaseType::F64 => Some(8),
            BaseType::String => None,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, BaseType::F64 | BaseType::Bool | BaseType::String)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BaseType::I8 | BaseType::I16 | BaseType::I32 | BaseType::I64
        )
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
