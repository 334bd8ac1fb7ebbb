/* Union emission: a fixed-size byte region with typed per-member views */

use super::helpers::{CodeWriter, camel_case_name, field_rust_type};
use super::marshal::emit_marshal_field;
use super::unmarshal::emit_unmarshal_field;
use crate::schema::ResolvedUnion;
use std::fmt;

pub fn emit_union(output: &mut String, union: &ResolvedUnion, emit_views: bool) -> fmt::Result {
  let name = camel_case_name(&union.name);
  let mut w = CodeWriter::new(output, 0);

  w.line(format!("// {} represents binary API union '{}'.", name, union.name))?;
  w.line("#[derive(Debug, Clone, PartialEq, Eq, Hash)]")?;
  w.open(format!("pub struct {} {{", name))?;
  w.line(format!("pub data: [u8; {}],", union.size))?;
  w.close("}")?;
  w.line("")?;

  w.open(format!("impl Default for {} {{", name))?;
  w.open("fn default() -> Self {")?;
  w.line(format!("Self {{ data: [0; {}] }}", union.size))?;
  w.close("}")?;
  w.close("}")?;
  w.line("")?;

  w.open(format!("impl {} {{", name))?;
  w.line(format!("pub const TYPE_NAME: &'static str = \"{}\";", union.name))?;
  w.line(format!("pub const SIZE: usize = {};", union.size))?;

  if emit_views {
    for member in &union.members {
      let member_name = member.name.trim_start_matches('_');
      let member_type = field_rust_type(member);
      let new_fn = format!("new_{}", member_name);
      let set_fn = format!("set_{}", member_name);
      let get_fn = format!("get_{}", member_name);
      let decode_fn = format!("decode_{}", member_name);

      w.line("")?;
      w.open(format!("pub fn {}(value: {}) -> Self {{", new_fn, member_type))?;
      w.line("let mut u = Self::default();")?;
      w.line(format!("u.{}(value);", set_fn))?;
      w.line("u")?;
      w.close("}")?;

      /* Bytes past this member keep whatever an earlier write left there */
      w.line("")?;
      w.open(format!("pub fn {}(&mut self, value: {}) {{", set_fn, member_type))?;
      w.line("let mut w = Writer::new(&mut self.data);")?;
      w.line("// field[1] value")?;
      emit_marshal_field(&mut w, member, "value", 1)?;
      w.close("}")?;

      w.line("")?;
      w.open(format!("pub fn {}(&self) -> {} {{", get_fn, member_type))?;
      w.line(format!("Self::{}(&mut Reader::new(&self.data)).unwrap_or_default()", decode_fn))?;
      w.close("}")?;

      w.line("")?;
      w.open(format!(
        "fn {}(r: &mut Reader<'_>) -> Result<{}, DecodeError> {{",
        decode_fn, member_type
      ))?;
      w.line(format!("let mut value: {} = Default::default();", member_type))?;
      w.line("// field[1] value")?;
      emit_unmarshal_field(&mut w, member, "value", "", 1)?;
      w.line("Ok(value)")?;
      w.close("}")?;
    }
  }

  w.close("}")
}
