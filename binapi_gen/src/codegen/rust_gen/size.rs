/* Size calculation emission: sums the wire size of every encoded field */

use super::helpers::{CodeWriter, field_name, uses_rust_array};
use crate::schema::{FieldRole, FieldShape, ResolvedField, ResolvedType, StringKind};
use std::fmt;

pub fn emit_size_fields(
  w: &mut CodeWriter<'_>,
  fields: &[ResolvedField],
  parent: &str,
  level: usize,
) -> fmt::Result {
  for field in fields.iter().filter(|f| f.is_encoded()) {
    let path = format!("{}.{}", parent, field_name(&field.name));
    w.line(format!("// field[{}] {}", level, path))?;
    emit_size_field(w, field, &path, level)?;
  }
  Ok(())
}

pub fn emit_size_field(
  w: &mut CodeWriter<'_>,
  field: &ResolvedField,
  path: &str,
  level: usize,
) -> fmt::Result {
  if let FieldRole::CountOf(_) = field.role {
    return emit_size_value(w, &field.ty, path, level);
  }
  match &field.shape {
    FieldShape::Scalar => emit_size_value(w, &field.ty, path, level),
    FieldShape::Fixed(len) => emit_size_fixed(w, &field.ty, *len, path, level),
    FieldShape::Counted { .. } => {
      if let Some(size) = field.ty.static_size() {
        return w.line(format!("size += {} * {}.len();", size, path));
      }
      let x = w.fresh_var("x");
      w.open(format!("for {} in {}.iter() {{", x, path))?;
      emit_size_value(w, &field.ty, &format!("(*{})", x), level)?;
      w.close("}")
    }
  }
}

fn emit_size_value(w: &mut CodeWriter<'_>, ty: &ResolvedType, path: &str, level: usize) -> fmt::Result {
  if let Some(size) = ty.static_size() {
    return w.line(format!("size += {};", size));
  }
  match ty {
    ResolvedType::String(StringKind::Variable) => w.line(format!("size += 4 + {}.len();", path)),
    ResolvedType::Alias(alias) if alias.length > 0 => {
      emit_size_fixed(w, &alias.inner, alias.length, path, level)
    }
    ResolvedType::Alias(alias) => emit_size_value(w, &alias.inner, path, level),
    ResolvedType::Struct(def) => emit_size_fields(w, &def.fields, path, level + 1),
    /* remaining kinds always have a static size */
    _ => Ok(()),
  }
}

fn emit_size_fixed(
  w: &mut CodeWriter<'_>,
  ty: &ResolvedType,
  len: usize,
  path: &str,
  level: usize,
) -> fmt::Result {
  if let Some(size) = ty.static_size() {
    return w.line(format!("size += {} * {};", size, len));
  }
  let x = w.fresh_var("x");
  if uses_rust_array(len) {
    w.open(format!("for {} in {}.iter() {{", x, path))?;
    emit_size_value(w, ty, &format!("(*{})", x), level)?;
  } else {
    let j = w.fresh_var("j");
    w.open(format!("for {} in 0..{} {{", j, len))?;
    w.line(format!("let {} = {}.get({}).cloned().unwrap_or_default();", x, path, j))?;
    emit_size_value(w, ty, &x, level)?;
  }
  w.close("}")
}
