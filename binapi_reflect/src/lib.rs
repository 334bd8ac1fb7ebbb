/* Binary API Runtime Codec
 *
 * This library walks the resolved field plans produced by binapi_gen at
 * runtime: it computes wire sizes, encodes dynamic values into big-endian
 * buffers and decodes buffers back into values, without generating code.
 */

pub mod codec;
pub mod errors;
pub mod json;
pub mod union;
pub mod value;
pub mod wire;

pub use codec::{Codec, Target};
pub use errors::{CodecError, CodecResult};
pub use union::UnionCodec;
pub use value::{EnumValue, StructValue, UnionValue, Value};
