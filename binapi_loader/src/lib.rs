//! Schema File Loading and Import Resolution
//!
//! This crate loads binary API schema modules from disk and resolves the
//! imports between them, producing modules ready for type resolution and
//! code generation.

pub mod file;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use file::{load_module, parse_module, SchemaFormat};
pub use resolver::ImportResolver;

// Re-export binapi_types for convenience
pub use binapi_types;
