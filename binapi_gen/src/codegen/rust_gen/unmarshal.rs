/* Unmarshal emission: reads every encoded field from a `Reader` named `r` into place */

use super::helpers::{CodeWriter, camel_case_name, field_name, get_method, leaf_expr, rust_type, uses_rust_array};
use crate::schema::{FieldShape, ResolvedField, ResolvedType, StringKind};
use std::fmt;

pub fn emit_unmarshal_fields(
  w: &mut CodeWriter<'_>,
  fields: &[ResolvedField],
  parent: &str,
  level: usize,
) -> fmt::Result {
  for field in fields.iter().filter(|f| f.is_encoded()) {
    let path = format!("{}.{}", parent, field_name(&field.name));
    w.line(format!("// field[{}] {}", level, path))?;
    emit_unmarshal_field(w, field, &path, parent, level)?;
  }
  Ok(())
}

/* Count fields decode as plain scalars, which leaves them equal to the array length */
pub fn emit_unmarshal_field(
  w: &mut CodeWriter<'_>,
  field: &ResolvedField,
  place: &str,
  parent: &str,
  level: usize,
) -> fmt::Result {
  match &field.shape {
    FieldShape::Scalar => emit_unmarshal_value(w, &field.ty, place, level),
    FieldShape::Fixed(len) => emit_unmarshal_fixed(w, &field.ty, *len, place, level),
    FieldShape::Counted { count_field } => {
      let count = format!("{}.{}", parent, field_name(count_field));
      w.line(format!(
        "{} = Vec::with_capacity(({} as usize).min(r.remaining()));",
        place, count
      ))?;
      emit_unmarshal_push_loop(w, &field.ty, &count, place, level)
    }
  }
}

fn emit_unmarshal_value(w: &mut CodeWriter<'_>, ty: &ResolvedType, place: &str, level: usize) -> fmt::Result {
  match ty {
    ResolvedType::Base(base) => w.line(format!("{} = r.{}()?;", leaf_expr(place), get_method(*base))),
    ResolvedType::String(StringKind::Fixed(len)) => {
      w.line(format!("{} = r.get_fixed_string({})?;", leaf_expr(place), len))
    }
    ResolvedType::String(StringKind::Variable) => w.line(format!("{} = r.get_string()?;", leaf_expr(place))),
    ResolvedType::Enum(def) => w.line(format!(
      "{} = {}(r.{}()?);",
      leaf_expr(place),
      camel_case_name(&def.name),
      get_method(def.base)
    )),
    ResolvedType::Alias(alias) if alias.length > 0 => {
      emit_unmarshal_fixed(w, &alias.inner, alias.length, place, level)
    }
    ResolvedType::Alias(alias) => emit_unmarshal_value(w, &alias.inner, place, level),
    ResolvedType::Struct(def) => emit_unmarshal_fields(w, &def.fields, place, level + 1),
    ResolvedType::Union(_) => w.line(format!("r.read_into(&mut {}.data)?;", place)),
  }
}

fn emit_unmarshal_fixed(
  w: &mut CodeWriter<'_>,
  ty: &ResolvedType,
  len: usize,
  place: &str,
  level: usize,
) -> fmt::Result {
  if uses_rust_array(len) {
    let x = w.fresh_var("x");
    w.open(format!("for {} in {}.iter_mut() {{", x, place))?;
    emit_unmarshal_value(w, ty, &format!("(*{})", x), level)?;
    return w.close("}");
  }
  w.line(format!("{} = Vec::with_capacity({});", place, len))?;
  emit_unmarshal_push_loop(w, ty, &len.to_string(), place, level)
}

/* Decode `count` elements into fresh locals and push them onto the Vec at `place` */
fn emit_unmarshal_push_loop(
  w: &mut CodeWriter<'_>,
  ty: &ResolvedType,
  count: &str,
  place: &str,
  level: usize,
) -> fmt::Result {
  let x = w.fresh_var("x");
  w.open(format!("for _ in 0..{} {{", count))?;
  w.line(format!("let mut {}: {} = Default::default();", x, rust_type(ty)))?;
  emit_unmarshal_value(w, ty, &x, level)?;
  w.line(format!("{}.push({});", place, x))?;
  w.close("}")
}
