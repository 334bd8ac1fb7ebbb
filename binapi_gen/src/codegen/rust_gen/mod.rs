pub mod helpers;
pub mod marshal;
pub mod message;
pub mod size;
pub mod types;
pub mod union;
pub mod unmarshal;

pub use message::emit_message;
pub use types::{emit_alias, emit_enum, emit_struct};
pub use union::emit_union;

/* Source of the runtime support module emitted next to generated modules */
pub const RUNTIME_MODULE: &str = include_str!("runtime_template.rs");

/* File stem of the runtime support module */
pub const RUNTIME_MODULE_NAME: &str = "binapi_runtime";
