/* Type definition emission for enums, aliases and structs */

use super::helpers::{
  CodeWriter, alias_rust_type, base_to_rust_type, camel_case_name, enum_literal, field_name,
  field_rust_type,
};
use crate::schema::{ResolvedAlias, ResolvedEnum, ResolvedField, ResolvedStruct};
use std::collections::HashSet;
use std::fmt;

/* Enums become transparent newtypes so unknown wire values survive decoding */
pub fn emit_enum(output: &mut String, def: &ResolvedEnum) -> fmt::Result {
  let name = camel_case_name(&def.name);
  let base = base_to_rust_type(def.base);
  let mut w = CodeWriter::new(output, 0);

  w.line(format!("// {} represents binary API enum '{}'.", name, def.name))?;
  w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]")?;
  w.line("#[repr(transparent)]")?;
  w.line(format!("pub struct {}(pub {});", name, base))?;
  w.line("")?;

  w.open(format!("impl {} {{", name))?;
  for entry in &def.entries {
    w.line(format!(
      "pub const {}: {} = {}({});",
      entry.name,
      name,
      name,
      enum_literal(def.base, entry.value)
    ))?;
  }
  if !def.entries.is_empty() {
    w.line("")?;
  }

  /* First entry wins when several share a value */
  let mut seen = HashSet::new();
  w.open("pub fn name(self) -> Option<&'static str> {")?;
  w.open("match self.0 {")?;
  for entry in &def.entries {
    if seen.insert(entry.value) {
      w.line(format!("{} => Some(\"{}\"),", enum_literal(def.base, entry.value), entry.name))?;
    }
  }
  w.line("_ => None,")?;
  w.close("}")?;
  w.close("}")?;
  w.line("")?;

  w.open("pub fn from_name(name: &str) -> Option<Self> {")?;
  w.open("match name {")?;
  for entry in &def.entries {
    w.line(format!("\"{}\" => Some(Self::{}),", entry.name, entry.name))?;
  }
  w.line("_ => None,")?;
  w.close("}")?;
  w.close("}")?;
  w.close("}")?;
  w.line("")?;

  w.open(format!("impl std::fmt::Display for {} {{", name))?;
  w.open("fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {")?;
  w.open("match self.name() {")?;
  w.line("Some(name) => f.write_str(name),")?;
  w.line(format!("None => write!(f, \"{}({{}})\", self.0),", name))?;
  w.close("}")?;
  w.close("}")?;
  w.close("}")
}

pub fn emit_alias(output: &mut String, def: &ResolvedAlias) -> fmt::Result {
  let name = camel_case_name(&def.name);
  let mut w = CodeWriter::new(output, 0);
  w.line(format!("// {} represents binary API alias '{}'.", name, def.name))?;
  w.line(format!("pub type {} = {};", name, alias_rust_type(def)))
}

/* Struct members for the encoded fields of a field list */
pub fn emit_struct_members(w: &mut CodeWriter<'_>, fields: &[ResolvedField]) -> fmt::Result {
  for field in fields.iter().filter(|f| f.is_encoded()) {
    emit_member(w, field)?;
  }
  Ok(())
}

fn emit_member(w: &mut CodeWriter<'_>, field: &ResolvedField) -> fmt::Result {
  if let Some(limit) = field.meta.limit {
    w.line(format!("/* limit: {} */", limit))?;
  }
  w.line(format!("pub {}: {},", field_name(&field.name), field_rust_type(field)))
}

pub fn emit_struct(output: &mut String, def: &ResolvedStruct) -> fmt::Result {
  let name = camel_case_name(&def.name);
  let mut w = CodeWriter::new(output, 0);

  w.line(format!("// {} represents binary API type '{}'.", name, def.name))?;
  w.line("#[derive(Debug, Clone, PartialEq, Default)]")?;
  if def.fields.is_empty() {
    w.line(format!("pub struct {} {{}}", name))?;
  } else {
    /* Types keep every declared field; the walks pass over the skipped ones */
    w.open(format!("pub struct {} {{", name))?;
    for field in &def.fields {
      if !field.is_encoded() {
        w.line("/* not encoded */")?;
      }
      emit_member(&mut w, field)?;
    }
    w.close("}")?;
  }
  w.line("")?;

  w.open(format!("impl {} {{", name))?;
  w.line(format!("pub const TYPE_NAME: &'static str = \"{}\";", def.name))?;
  w.close("}")
}
