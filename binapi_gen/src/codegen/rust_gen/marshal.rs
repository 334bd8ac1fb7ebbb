/* Marshal emission: writes every encoded field big-endian through a `Writer` named `w` */

use super::helpers::{CodeWriter, base_to_rust_type, field_name, leaf_expr, put_method, uses_rust_array};
use crate::schema::{FieldRole, FieldShape, ResolvedField, ResolvedType, StringKind};
use binapi_types::BaseType;
use std::fmt;

pub fn emit_marshal_fields(
  w: &mut CodeWriter<'_>,
  fields: &[ResolvedField],
  parent: &str,
  level: usize,
) -> fmt::Result {
  for field in fields.iter().filter(|f| f.is_encoded()) {
    let path = format!("{}.{}", parent, field_name(&field.name));
    w.line(format!("// field[{}] {}", level, path))?;

    /* A count field writes the live length of its array, never its own value */
    if let FieldRole::CountOf(array) = &field.role {
      let base = field.ty.integer_base().unwrap_or(BaseType::U32);
      let len = format!("{}.{}.len()", parent, field_name(array));
      w.line(format!(
        "w.{}({}::try_from({}).map_err(|_| EncodeError::CountOverflow {{ field: \"{}\", count: {} }})?);",
        put_method(base),
        base_to_rust_type(base),
        len,
        field.name,
        len
      ))?;
      continue;
    }
    emit_marshal_field(w, field, &path, level)?;
  }
  Ok(())
}

pub fn emit_marshal_field(
  w: &mut CodeWriter<'_>,
  field: &ResolvedField,
  path: &str,
  level: usize,
) -> fmt::Result {
  match &field.shape {
    FieldShape::Scalar => emit_marshal_value(w, &field.ty, path, level),
    FieldShape::Fixed(len) => emit_marshal_fixed(w, &field.ty, *len, path, level),
    FieldShape::Counted { .. } => {
      let x = w.fresh_var("x");
      w.open(format!("for {} in {}.iter() {{", x, path))?;
      emit_marshal_value(w, &field.ty, &format!("(*{})", x), level)?;
      w.close("}")
    }
  }
}

fn emit_marshal_value(w: &mut CodeWriter<'_>, ty: &ResolvedType, path: &str, level: usize) -> fmt::Result {
  match ty {
    ResolvedType::Base(base) => w.line(format!("w.{}({});", put_method(*base), leaf_expr(path))),
    ResolvedType::String(StringKind::Fixed(len)) => {
      w.line(format!("w.put_fixed_string(&{}, {});", leaf_expr(path), len))
    }
    ResolvedType::String(StringKind::Variable) => w.line(format!("w.put_string(&{});", leaf_expr(path))),
    ResolvedType::Enum(def) => w.line(format!("w.{}({}.0);", put_method(def.base), path)),
    ResolvedType::Alias(alias) if alias.length > 0 => {
      emit_marshal_fixed(w, &alias.inner, alias.length, path, level)
    }
    ResolvedType::Alias(alias) => emit_marshal_value(w, &alias.inner, path, level),
    ResolvedType::Struct(def) => emit_marshal_fields(w, &def.fields, path, level + 1),
    ResolvedType::Union(_) => w.line(format!("w.put_bytes(&{}.data);", path)),
  }
}

/* Fixed arrays always write `len` elements: short Vecs are padded with defaults */
fn emit_marshal_fixed(
  w: &mut CodeWriter<'_>,
  ty: &ResolvedType,
  len: usize,
  path: &str,
  level: usize,
) -> fmt::Result {
  let x = w.fresh_var("x");
  if uses_rust_array(len) {
    w.open(format!("for {} in {}.iter() {{", x, path))?;
    emit_marshal_value(w, ty, &format!("(*{})", x), level)?;
  } else {
    let j = w.fresh_var("j");
    w.open(format!("for {} in 0..{} {{", j, len))?;
    w.line(format!("let {} = {}.get({}).cloned().unwrap_or_default();", x, path, j))?;
    emit_marshal_value(w, ty, &x, level)?;
  }
  w.close("}")
}
