/* Message emission: struct definition plus the `Message` implementation */

use super::helpers::{CodeWriter, camel_case_name};
use super::marshal::emit_marshal_fields;
use super::size::emit_size_fields;
use super::types::emit_struct_members;
use super::unmarshal::emit_unmarshal_fields;
use crate::schema::ResolvedMessage;
use std::fmt;

pub fn emit_message(output: &mut String, msg: &ResolvedMessage) -> fmt::Result {
  let name = camel_case_name(&msg.name);
  let mut w = CodeWriter::new(output, 0);

  w.line(format!("// {} represents binary API message '{}'.", name, msg.name))?;
  w.line("#[derive(Debug, Clone, PartialEq, Default)]")?;
  if msg.encoded_fields().next().is_none() {
    w.line(format!("pub struct {} {{}}", name))?;
  } else {
    w.open(format!("pub struct {} {{", name))?;
    emit_struct_members(&mut w, &msg.fields)?;
    w.close("}")?;
  }
  w.line("")?;

  w.open(format!("impl Message for {} {{", name))?;
  w.line(format!("const NAME: &'static str = \"{}\";", msg.name))?;
  w.line(format!("const CRC: &'static str = \"{}\";", msg.crc_string()))?;
  w.line("")?;

  w.open("fn message_type(&self) -> MessageType {")?;
  w.line(format!("MessageType::{}", msg.message_type.variant_name()))?;
  w.close("}")?;
  w.line("")?;

  w.open("fn size(&self) -> usize {")?;
  w.line("let m = self;")?;
  w.line("let mut size = 0;")?;
  emit_size_fields(&mut w, &msg.fields, "m", 1)?;
  w.line("size")?;
  w.close("}")?;
  w.line("")?;

  w.open("fn marshal_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {")?;
  w.line("let m = self;")?;
  w.line("let required = m.size();")?;
  w.open("if buf.len() < required {")?;
  w.line("return Err(EncodeError::BufferTooSmall { required, available: buf.len() });")?;
  w.close("}")?;
  w.line("let mut w = Writer::new(&mut buf[..required]);")?;
  emit_marshal_fields(&mut w, &msg.fields, "m", 1)?;
  w.line("Ok(w.position())")?;
  w.close("}")?;
  w.line("")?;

  w.open("fn unmarshal(buf: &[u8]) -> Result<Self, DecodeError> {")?;
  w.line("let mut r = Reader::new(buf);")?;
  w.line("let mut m = Self::default();")?;
  emit_unmarshal_fields(&mut w, &msg.fields, "m", 1)?;
  w.line("Ok(m)")?;
  w.close("}")?;

  w.close("}")
}
