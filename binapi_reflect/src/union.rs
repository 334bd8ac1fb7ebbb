/* Typed member views over a union's shared byte region */

use crate::codec::{decode_field, encode_field, join_path, size_field};
use crate::errors::{CodecError, CodecResult};
use crate::value::{StructValue, UnionValue, Value};
use crate::wire::{Reader, Writer};
use binapi_gen::schema::{ResolvedField, ResolvedUnion};
use std::sync::Arc;
use tracing::warn;

pub struct UnionCodec {
    def: Arc<ResolvedUnion>,
}

impl UnionCodec {
    pub fn new(def: Arc<ResolvedUnion>) -> Self {
        UnionCodec { def }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Wire size: the largest member size.
    pub fn size(&self) -> usize {
        self.def.size
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.def.members.iter().map(|m| m.name.as_str())
    }

    fn member(&self, name: &str) -> CodecResult<&ResolvedField> {
        self.def.member(name).ok_or_else(|| CodecError::UnknownMember {
            union: self.def.name.clone(),
            member: name.to_string(),
        })
    }

    pub fn zeroed(&self) -> UnionValue {
        UnionValue::zeroed(self.def.size)
    }

    /// Zeroed union holding `value` in `member`; the value is validated first.
    pub fn new_with(&self, member: &str, value: &Value) -> CodecResult<UnionValue> {
        let field = self.member(member)?;
        let path = join_path(&self.def.name, member);
        size_field(field, value, &path)?;

        let mut union = self.zeroed();
        encode_field(field, value, &mut Writer::new(&mut union.data), &path)?;
        Ok(union)
    }

    /// Write `value` at the start of the region. Bytes past the member keep
    /// their previous contents. A failed write is logged and dropped, leaving
    /// whatever was written before the failure.
    pub fn set(&self, union: &mut UnionValue, member: &str, value: &Value) {
        if let Err(err) = self.try_set(union, member, value) {
            warn!(union = %self.def.name, member, error = %err, "union member write dropped");
        }
    }

    fn try_set(&self, union: &mut UnionValue, member: &str, value: &Value) -> CodecResult<()> {
        let field = self.member(member)?;
        let path = join_path(&self.def.name, member);
        encode_field(field, value, &mut Writer::new(&mut union.data), &path)
    }

    /// Decode `member` from the start of the region.
    pub fn get(&self, union: &UnionValue, member: &str) -> CodecResult<Value> {
        let field = self.member(member)?;
        let path = join_path(&self.def.name, member);
        decode_field(field, &StructValue::new(), &mut Reader::new(&union.data), &path)
    }
}
