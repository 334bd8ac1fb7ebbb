/* Helper utilities for Rust code generation */

use crate::schema::{FieldShape, ResolvedAlias, ResolvedField, ResolvedType};
use binapi_types::BaseType;
use std::fmt::{self, Write};

/* Indentation of emitted code */
pub const INDENT: &str = "    ";

/* Longest fixed array emitted as a Rust array; longer ones become Vec */
pub const MAX_ARRAY_LEN: usize = 32;

/* Rust reserved keywords that need to be escaped with r# */
const RUST_KEYWORDS: &[&str] = &[
  "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
  "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
  "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
  "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
  "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

pub fn escape_rust_keyword(name: &str) -> String {
  if RUST_KEYWORDS.contains(&name) {
    format!("r#{}", name)
  } else {
    name.to_string()
  }
}

/* "memif_create_reply" -> "MemifCreateReply" */
pub fn camel_case_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  for part in name.trim_start_matches('_').split('_').filter(|p| !p.is_empty()) {
    let mut chars = part.chars();
    if let Some(first) = chars.next() {
      out.extend(first.to_uppercase());
      out.push_str(chars.as_str());
    }
  }
  out
}

/* Struct member name for a schema field */
pub fn field_name(name: &str) -> String {
  escape_rust_keyword(name.trim_start_matches('_'))
}

pub fn base_to_rust_type(base: BaseType) -> &'static str {
  match base {
    BaseType::I8 => "i8",
    BaseType::U8 => "u8",
    BaseType::I16 => "i16",
    BaseType::U16 => "u16",
    BaseType::I32 => "i32",
    BaseType::U32 => "u32",
    BaseType::I64 => "i64",
    BaseType::U64 => "u64",
    BaseType::F64 => "f64",
    BaseType::Bool => "bool",
    BaseType::String => "String",
  }
}

pub fn put_method(base: BaseType) -> &'static str {
  match base {
    BaseType::I8 => "put_i8",
    BaseType::U8 => "put_u8",
    BaseType::I16 => "put_i16",
    BaseType::U16 => "put_u16",
    BaseType::I32 => "put_i32",
    BaseType::U32 => "put_u32",
    BaseType::I64 => "put_i64",
    BaseType::U64 => "put_u64",
    BaseType::F64 => "put_f64",
    BaseType::Bool => "put_bool",
    BaseType::String => "put_string",
  }
}

pub fn get_method(base: BaseType) -> &'static str {
  match base {
    BaseType::I8 => "get_i8",
    BaseType::U8 => "get_u8",
    BaseType::I16 => "get_i16",
    BaseType::U16 => "get_u16",
    BaseType::I32 => "get_i32",
    BaseType::U32 => "get_u32",
    BaseType::I64 => "get_i64",
    BaseType::U64 => "get_u64",
    BaseType::F64 => "get_f64",
    BaseType::Bool => "get_bool",
    BaseType::String => "get_string",
  }
}

pub fn uses_rust_array(len: usize) -> bool {
  len <= MAX_ARRAY_LEN
}

pub fn array_type(element: &str, len: usize) -> String {
  if uses_rust_array(len) {
    format!("[{}; {}]", element, len)
  } else {
    format!("Vec<{}>", element)
  }
}

/* Rust type of a single value of a resolved type */
pub fn rust_type(ty: &ResolvedType) -> String {
  match ty {
    ResolvedType::Base(base) => base_to_rust_type(*base).to_string(),
    ResolvedType::String(_) => "String".to_string(),
    ResolvedType::Enum(def) => camel_case_name(&def.name),
    ResolvedType::Alias(def) => camel_case_name(&def.name),
    ResolvedType::Struct(def) => camel_case_name(&def.name),
    ResolvedType::Union(def) => camel_case_name(&def.name),
  }
}

pub fn field_rust_type(field: &ResolvedField) -> String {
  let element = rust_type(&field.ty);
  match &field.shape {
    FieldShape::Scalar => element,
    FieldShape::Fixed(len) => array_type(&element, *len),
    FieldShape::Counted { .. } => format!("Vec<{}>", element),
  }
}

/* Right-hand side of an alias `pub type` */
pub fn alias_rust_type(alias: &ResolvedAlias) -> String {
  let inner = rust_type(&alias.inner);
  if alias.length > 0 { array_type(&inner, alias.length) } else { inner }
}

/* Literal of an enum value in its base type, wrapping out-of-range values */
pub fn enum_literal(base: BaseType, value: i64) -> String {
  match base {
    BaseType::I8 => (value as i8).to_string(),
    BaseType::U8 => (value as u8).to_string(),
    BaseType::I16 => (value as i16).to_string(),
    BaseType::U16 => (value as u16).to_string(),
    BaseType::I32 => (value as i32).to_string(),
    BaseType::U32 => (value as u32).to_string(),
    BaseType::U64 => (value as u64).to_string(),
    _ => value.to_string(),
  }
}

/* Loop elements are bound by reference as `(*xN)`; a bare leaf reads better as `*xN` */
pub fn leaf_expr(path: &str) -> &str {
  match path.strip_prefix('(').and_then(|p| p.strip_suffix(')')) {
    Some(inner) if inner.starts_with('*') && !inner.contains(['.', '(']) => inner,
    _ => path,
  }
}

/* Indented line writer used by all emitters */
pub struct CodeWriter<'o> {
  out: &'o mut String,
  depth: usize,
  vars: usize,
}

impl<'o> CodeWriter<'o> {
  pub fn new(out: &'o mut String, depth: usize) -> Self {
    Self { out, depth, vars: 0 }
  }

  pub fn line(&mut self, text: impl AsRef<str>) -> fmt::Result {
    let text = text.as_ref();
    if text.is_empty() {
      return writeln!(self.out);
    }
    writeln!(self.out, "{}{}", INDENT.repeat(self.depth), text)
  }

  /* Write a line ending in `{` and indent what follows */
  pub fn open(&mut self, text: impl AsRef<str>) -> fmt::Result {
    self.line(text)?;
    self.depth += 1;
    Ok(())
  }

  pub fn close(&mut self, text: impl AsRef<str>) -> fmt::Result {
    self.depth = self.depth.saturating_sub(1);
    self.line(text)
  }

  /* Unique local name for loop variables of nested walks */
  pub fn fresh_var(&mut self, prefix: &str) -> String {
    self.vars += 1;
    format!("{}{}", prefix, self.vars)
  }
}
