//! Binary API Schema Definitions
//!
//! This crate contains the in-memory model of a binary API schema: modules
//! holding enums, aliases, structs, unions and messages made of typed fields.
//! It provides pure data structures without any file I/O or code generation
//! logic.

pub mod base;
pub mod types;

// Re-export commonly used types at the crate root
pub use base::*;
pub use types::*;
