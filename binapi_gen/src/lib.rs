/* Binary API code generation
 *
 * Resolves schema modules into a field-level plan (type resolution, internal
 * field skipping, count fields, union sizing, message classification) and
 * emits Rust sources with size/marshal/unmarshal procedures from that plan.
 */

pub mod cmds;
pub mod codegen;
pub mod schema;

pub use schema::{
  MessageType, ResolutionError, ResolvedModule, TypeRegistry, TypeResolver, resolve_module,
};
