use super::classify::{MessageType, classify_message};
use super::errors::ResolutionError;
use super::registry::{TypeClass, TypeRegistry};
use super::{CLIENT_INDEX_FIELD, CONTEXT_FIELD, MSG_ID_FIELD};
use binapi_types::{
  AliasDef, BaseType, EnumDef, EnumEntry, Field, FieldMeta, MessageDef, StructDef, UnionDef,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
  /* NUL padded to exactly this many bytes */
  Fixed(usize),
  /* u32 length prefix followed by the bytes */
  Variable,
}

/* A type reference after lookup, with every name replaced by its definition */
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
  /* Any base type except string */
  Base(BaseType),
  String(StringKind),
  Enum(Arc<ResolvedEnum>),
  Alias(Arc<ResolvedAlias>),
  Struct(Arc<ResolvedStruct>),
  Union(Arc<ResolvedUnion>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnum {
  pub name: String,
  pub base: BaseType,
  pub entries: Vec<EnumEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlias {
  pub name: String,
  pub inner: ResolvedType,
  /* Non-zero: the alias is a fixed array of `inner` */
  pub length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStruct {
  pub name: String,
  pub fields: Vec<ResolvedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnion {
  pub name: String,
  /* Largest member wire size */
  pub size: usize,
  pub members: Vec<ResolvedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMessage {
  pub name: String,
  pub crc: String,
  pub message_type: MessageType,
  pub fields: Vec<ResolvedField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
  Scalar,
  Fixed(usize),
  Counted { count_field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
  Data,
  /* Protocol bookkeeping, carried by the transport header */
  Skipped,
  /* Encodes the element count of the named sibling array */
  CountOf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
  pub name: String,
  pub shape: FieldShape,
  pub ty: ResolvedType,
  pub role: FieldRole,
  pub meta: FieldMeta,
}

impl ResolvedType {
  /* Wire size when it does not depend on runtime values */
  pub fn static_size(&self) -> Option<usize> {
    match self {
      ResolvedType::Base(base) => base.wire_size(),
      ResolvedType::String(StringKind::Fixed(len)) => Some(*len),
      ResolvedType::String(StringKind::Variable) => None,
      ResolvedType::Enum(def) => def.base.wire_size(),
      ResolvedType::Alias(def) => def.static_size(),
      ResolvedType::Struct(def) => def.static_size(),
      ResolvedType::Union(def) => Some(def.size),
    }
  }

  /* Schema-level name of the type */
  pub fn type_name(&self) -> String {
    match self {
      ResolvedType::Base(base) => base.name().to_string(),
      ResolvedType::String(StringKind::Fixed(len)) => format!("string[{len}]"),
      ResolvedType::String(StringKind::Variable) => "string".to_string(),
      ResolvedType::Enum(def) => def.name.clone(),
      ResolvedType::Alias(def) => def.name.clone(),
      ResolvedType::Struct(def) => def.name.clone(),
      ResolvedType::Union(def) => def.name.clone(),
    }
  }

  pub fn integer_base(&self) -> Option<BaseType> {
    match self {
      ResolvedType::Base(base) if base.is_integer() => Some(*base),
      _ => None,
    }
  }
}

impl ResolvedEnum {
  pub fn entry_name(&self, value: i64) -> Option<&str> {
    self.entries.iter().find(|e| e.value == value).map(|e| e.name.as_str())
  }

  pub fn entry_value(&self, name: &str) -> Option<i64> {
    self.entries.iter().find(|e| e.name == name).map(|e| e.value)
  }
}

impl ResolvedAlias {
  pub fn static_size(&self) -> Option<usize> {
    let inner = self.inner.static_size()?;
    if self.length > 0 { Some(inner * self.length) } else { Some(inner) }
  }
}

impl ResolvedStruct {
  pub fn static_size(&self) -> Option<usize> {
    fields_static_size(&self.fields)
  }
}

impl ResolvedUnion {
  pub fn member(&self, name: &str) -> Option<&ResolvedField> {
    self.members.iter().find(|m| m.name == name)
  }
}

impl ResolvedMessage {
  pub fn static_size(&self) -> Option<usize> {
    fields_static_size(&self.fields)
  }

  pub fn encoded_fields(&self) -> impl Iterator<Item = &ResolvedField> {
    self.fields.iter().filter(|f| f.is_encoded())
  }

  /* CRC without the leading 0x */
  pub fn crc_string(&self) -> &str {
    self.crc.trim_start_matches("0x")
  }
}

impl ResolvedField {
  pub fn is_encoded(&self) -> bool {
    self.role != FieldRole::Skipped
  }

  pub fn static_size(&self) -> Option<usize> {
    if !self.is_encoded() {
      return Some(0);
    }
    match &self.shape {
      FieldShape::Scalar => self.ty.static_size(),
      FieldShape::Fixed(len) => self.ty.static_size().map(|s| s * len),
      FieldShape::Counted { .. } => None,
    }
  }
}

fn fields_static_size(fields: &[ResolvedField]) -> Option<usize> {
  fields.iter().map(ResolvedField::static_size).sum()
}

/* Message-id is always internal; client_index and context only before any field was kept */
fn is_internal_field(name: &str, retained: usize) -> bool {
  let lower = name.to_ascii_lowercase();
  lower == MSG_ID_FIELD || (retained == 0 && (lower == CLIENT_INDEX_FIELD || lower == CONTEXT_FIELD))
}

/* Compiles schema definitions into resolved plans, caching each named type */
pub struct TypeResolver<'r> {
  registry: &'r TypeRegistry,
  enums: IndexMap<String, Arc<ResolvedEnum>>,
  aliases: IndexMap<String, Arc<ResolvedAlias>>,
  structs: IndexMap<String, Arc<ResolvedStruct>>,
  unions: IndexMap<String, Arc<ResolvedUnion>>,
  /* Definitions currently being resolved, outermost first */
  stack: Vec<String>,
}

impl<'r> TypeResolver<'r> {
  pub fn new(registry: &'r TypeRegistry) -> Self {
    Self {
      registry,
      enums: IndexMap::new(),
      aliases: IndexMap::new(),
      structs: IndexMap::new(),
      unions: IndexMap::new(),
      stack: Vec::new(),
    }
  }

  pub fn registry(&self) -> &'r TypeRegistry {
    self.registry
  }

  pub fn resolve_type(&mut self, type_ref: &str) -> Result<ResolvedType, ResolutionError> {
    let registry = self.registry;
    let resolved = match registry.resolve(type_ref)? {
      TypeClass::Base(BaseType::String) => ResolvedType::String(StringKind::Variable),
      TypeClass::Base(base) => ResolvedType::Base(base),
      TypeClass::Enum(def) => ResolvedType::Enum(self.resolve_enum(def)?),
      TypeClass::Alias(def) => ResolvedType::Alias(self.resolve_alias(def)?),
      TypeClass::Struct(def) => ResolvedType::Struct(self.resolve_struct(def)?),
      TypeClass::Union(def) => ResolvedType::Union(self.resolve_union(def)?),
    };
    Ok(resolved)
  }

  pub fn resolve_enum(&mut self, def: &EnumDef) -> Result<Arc<ResolvedEnum>, ResolutionError> {
    if let Some(resolved) = self.enums.get(&def.name) {
      return Ok(resolved.clone());
    }
    if !def.base.is_integer() {
      return Err(ResolutionError::InvalidEnumBase {
        name: def.name.clone(),
        base: def.base.name().to_string(),
      });
    }
    let resolved = Arc::new(ResolvedEnum {
      name: def.name.clone(),
      base: def.base,
      entries: def.entries.clone(),
    });
    self.enums.insert(def.name.clone(), resolved.clone());
    Ok(resolved)
  }

  pub fn resolve_alias(&mut self, def: &AliasDef) -> Result<Arc<ResolvedAlias>, ResolutionError> {
    if let Some(resolved) = self.aliases.get(&def.name) {
      return Ok(resolved.clone());
    }

    self.enter(&def.name)?;
    let inner = self.resolve_type(&def.type_ref);
    self.stack.pop();
    let inner = inner.map_err(|e| e.referenced_by(&def.name, "type"))?;

    /* A string alias carries its length as the fixed string length */
    let (inner, length) = match inner {
      ResolvedType::String(_) if def.length > 0 => {
        (ResolvedType::String(StringKind::Fixed(def.length)), 0)
      }
      ResolvedType::String(_) => (ResolvedType::String(StringKind::Variable), 0),
      other => (other, def.length),
    };

    trace!(alias = %def.name, target = %inner.type_name(), length, "resolved alias");
    let resolved = Arc::new(ResolvedAlias { name: def.name.clone(), inner, length });
    self.aliases.insert(def.name.clone(), resolved.clone());
    Ok(resolved)
  }

  pub fn resolve_struct(&mut self, def: &StructDef) -> Result<Arc<ResolvedStruct>, ResolutionError> {
    if let Some(resolved) = self.structs.get(&def.name) {
      return Ok(resolved.clone());
    }

    self.enter(&def.name)?;
    let fields = self.resolve_fields(&def.name, &def.fields);
    self.stack.pop();

    let resolved = Arc::new(ResolvedStruct { name: def.name.clone(), fields: fields? });
    trace!(name = %def.name, size = ?resolved.static_size(), "resolved struct");
    self.structs.insert(def.name.clone(), resolved.clone());
    Ok(resolved)
  }

  pub fn resolve_union(&mut self, def: &UnionDef) -> Result<Arc<ResolvedUnion>, ResolutionError> {
    if let Some(resolved) = self.unions.get(&def.name) {
      return Ok(resolved.clone());
    }

    self.enter(&def.name)?;
    let members = self.resolve_members(&def.name, &def.fields);
    self.stack.pop();
    let members = members?;

    let mut size = 0;
    for member in &members {
      let member_size = member.static_size().ok_or_else(|| ResolutionError::UnsizedUnionMember {
        union: def.name.clone(),
        member: member.name.clone(),
      })?;
      size = size.max(member_size);
    }

    trace!(union = %def.name, size, members = members.len(), "resolved union");
    let resolved = Arc::new(ResolvedUnion { name: def.name.clone(), size, members });
    self.unions.insert(def.name.clone(), resolved.clone());
    Ok(resolved)
  }

  pub fn resolve_message(&mut self, def: &MessageDef) -> Result<ResolvedMessage, ResolutionError> {
    let fields = self.resolve_fields(&def.name, &def.fields)?;
    let message_type = classify_message(def);
    trace!(message = %def.name, %message_type, fields = fields.len(), "resolved message");
    Ok(ResolvedMessage {
      name: def.name.clone(),
      crc: def.crc.clone(),
      message_type,
      fields,
    })
  }

  /* Resolve a struct or message field list, applying the internal-field skip rule
   * and binding count fields to their arrays. */
  pub fn resolve_fields(
    &mut self,
    owner: &str,
    fields: &[Field],
  ) -> Result<Vec<ResolvedField>, ResolutionError> {
    let mut retained = 0;
    let mut resolved = Vec::with_capacity(fields.len());

    for field in fields {
      let skipped = is_internal_field(&field.name, retained);
      if !skipped {
        retained += 1;
      }
      let mut resolved_field = self.resolve_field(owner, field)?;
      if skipped {
        resolved_field.role = FieldRole::Skipped;
      }
      resolved.push(resolved_field);
    }

    bind_count_fields(owner, &mut resolved)?;
    Ok(resolved)
  }

  fn resolve_members(
    &mut self,
    owner: &str,
    fields: &[Field],
  ) -> Result<Vec<ResolvedField>, ResolutionError> {
    fields.iter().map(|field| self.resolve_field(owner, field)).collect()
  }

  fn resolve_field(&mut self, owner: &str, field: &Field) -> Result<ResolvedField, ResolutionError> {
    let ty = self
      .resolve_type(&field.type_ref)
      .map_err(|e| e.referenced_by(owner, &field.name))?;

    let size_from = field.size_from.as_deref().filter(|s| !s.is_empty());
    let (ty, shape) = match ty {
      /* Strings are never arrays: the length selects the fixed encoding */
      ResolvedType::String(_) => {
        let kind = if field.length > 0 { StringKind::Fixed(field.length) } else { StringKind::Variable };
        (ResolvedType::String(kind), FieldShape::Scalar)
      }
      ty => {
        let shape = if let Some(count_field) = size_from {
          /* Each element must consume input, or a bare count drives the decode loop */
          if ty.static_size() == Some(0) {
            return Err(ResolutionError::ZeroSizedElement {
              owner: owner.to_string(),
              field: field.name.clone(),
            });
          }
          FieldShape::Counted { count_field: count_field.to_string() }
        } else if field.length > 0 {
          FieldShape::Fixed(field.length)
        } else if field.array {
          return Err(ResolutionError::UnboundedArray {
            owner: owner.to_string(),
            field: field.name.clone(),
          });
        } else {
          FieldShape::Scalar
        };
        (ty, shape)
      }
    };

    Ok(ResolvedField {
      name: field.name.clone(),
      shape,
      ty,
      role: FieldRole::Data,
      meta: field.meta.clone(),
    })
  }

  fn enter(&mut self, name: &str) -> Result<(), ResolutionError> {
    if let Some(pos) = self.stack.iter().position(|n| n == name) {
      let mut chain = self.stack[pos..].to_vec();
      chain.push(name.to_string());
      return Err(ResolutionError::CircularDependency(chain));
    }
    self.stack.push(name.to_string());
    Ok(())
  }
}

fn invalid_size_from(owner: &str, array: &str, count_field: &str, reason: &str) -> ResolutionError {
  ResolutionError::InvalidSizeFrom {
    owner: owner.to_string(),
    field: array.to_string(),
    size_from: count_field.to_string(),
    reason: reason.to_string(),
  }
}

/* Mark every field named by a sibling's size-from as that array's count */
fn bind_count_fields(owner: &str, fields: &mut [ResolvedField]) -> Result<(), ResolutionError> {
  for i in 0..fields.len() {
    let FieldShape::Counted { count_field } = &fields[i].shape else {
      continue;
    };
    let count_field = count_field.clone();
    let array = fields[i].name.clone();

    let Some(pos) = fields.iter().position(|f| f.name == count_field) else {
      return Err(invalid_size_from(owner, &array, &count_field, "no such sibling field"));
    };
    if pos > i {
      return Err(invalid_size_from(owner, &array, &count_field, "count field must precede the array"));
    }
    let counter = &fields[pos];
    if pos == i || counter.shape != FieldShape::Scalar || counter.ty.integer_base().is_none() {
      return Err(invalid_size_from(owner, &array, &count_field, "count field must be a scalar integer"));
    }
    match &counter.role {
      FieldRole::Skipped => {
        return Err(invalid_size_from(owner, &array, &count_field, "count field is not encoded"));
      }
      FieldRole::CountOf(other) => {
        let reason = format!("count field already counts '{other}'");
        return Err(invalid_size_from(owner, &array, &count_field, &reason));
      }
      FieldRole::Data => {}
    }
    fields[pos].role = FieldRole::CountOf(array);
  }
  Ok(())
}
