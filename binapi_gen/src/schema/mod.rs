pub mod classify;
pub mod driver;
pub mod errors;
pub mod registry;
pub mod resolved;

pub use classify::{MessageType, classify_fields, classify_message};
pub use driver::{ResolvedModule, resolve_module, resolve_modules};
pub use errors::ResolutionError;
pub use registry::{TypeClass, TypeRegistry};
pub use resolved::{
  FieldRole, FieldShape, ResolvedAlias, ResolvedEnum, ResolvedField, ResolvedMessage, ResolvedStruct,
  ResolvedType, ResolvedUnion, StringKind, TypeResolver,
};

/* Names of the protocol bookkeeping fields */
pub const MSG_ID_FIELD: &str = "_vl_msg_id";
pub const CLIENT_INDEX_FIELD: &str = "client_index";
pub const CONTEXT_FIELD: &str = "context";
