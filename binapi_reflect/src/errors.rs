use binapi_types::BaseType;
use thiserror::Error;

/// Result alias used across the codec crate.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while sizing, encoding, decoding or converting values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// No message or type with this name was registered with the codec.
    #[error("unknown message or type '{name}'")]
    UnknownTarget { name: String },

    /// A field required by the plan is absent from the value.
    #[error("missing field '{path}'")]
    MissingField { path: String },

    /// A JSON object carries a key the plan does not know.
    #[error("unknown field '{path}'")]
    UnknownField { path: String },

    /// The value's variant does not fit the planned type.
    #[error("'{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// An integer does not fit the wire type.
    #[error("'{path}': value {value} out of range for {base}")]
    OutOfRange {
        path: String,
        value: String,
        base: BaseType,
    },

    /// Enum entry name not defined by the enum.
    #[error("'{path}': '{entry}' is not an entry of enum {enum_name}")]
    UnknownEnumEntry {
        path: String,
        enum_name: String,
        entry: String,
    },

    /// Union has no member with this name.
    #[error("union {union} has no member '{member}'")]
    UnknownMember { union: String, member: String },

    /// Union bytes do not match the union's wire size.
    #[error("'{path}': union data is {found} bytes, expected {expected}")]
    UnionSize {
        path: String,
        expected: usize,
        found: usize,
    },

    /// Caller-supplied output buffer is shorter than the encoded size.
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall { required: usize, available: usize },

    /// Input ended before a read completed.
    #[error("short buffer at offset {offset}: need {needed} bytes, have {available}")]
    ShortBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Malformed JSON input for a field.
    #[error("'{path}': {reason}")]
    InvalidJson { path: String, reason: String },
}
