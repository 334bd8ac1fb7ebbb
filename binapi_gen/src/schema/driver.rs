use super::errors::ResolutionError;
use super::registry::TypeRegistry;
use super::resolved::{
  ResolvedAlias, ResolvedEnum, ResolvedMessage, ResolvedStruct, ResolvedType, ResolvedUnion,
  TypeResolver,
};
use binapi_types::Module;
use std::sync::Arc;
use tracing::debug;

/* Every definition of one module, resolved in declaration order */
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
  pub name: String,
  pub version: String,
  pub crc: String,
  pub imports: Vec<String>,
  pub enums: Vec<Arc<ResolvedEnum>>,
  pub aliases: Vec<Arc<ResolvedAlias>>,
  pub structs: Vec<Arc<ResolvedStruct>>,
  pub unions: Vec<Arc<ResolvedUnion>>,
  pub messages: Vec<ResolvedMessage>,
}

impl ResolvedModule {
  pub fn message(&self, name: &str) -> Option<&ResolvedMessage> {
    self.messages.iter().find(|m| m.name == name)
  }

  /* Named non-message type defined by this module */
  pub fn find_type(&self, name: &str) -> Option<ResolvedType> {
    if let Some(def) = self.enums.iter().find(|d| d.name == name) {
      return Some(ResolvedType::Enum(def.clone()));
    }
    if let Some(def) = self.aliases.iter().find(|d| d.name == name) {
      return Some(ResolvedType::Alias(def.clone()));
    }
    if let Some(def) = self.structs.iter().find(|d| d.name == name) {
      return Some(ResolvedType::Struct(def.clone()));
    }
    self
      .unions
      .iter()
      .find(|d| d.name == name)
      .map(|d| ResolvedType::Union(d.clone()))
  }

  /* Count of named types, messages excluded */
  pub fn type_count(&self) -> usize {
    self.enums.len() + self.aliases.len() + self.structs.len() + self.unions.len()
  }
}

impl<'r> TypeResolver<'r> {
  pub fn resolve_module(&mut self, module: &Module) -> Result<ResolvedModule, ResolutionError> {
    let mut resolved = ResolvedModule {
      name: module.name.clone(),
      version: module.version.clone(),
      crc: module.crc.clone(),
      imports: module.imports.clone(),
      enums: Vec::with_capacity(module.enums.len()),
      aliases: Vec::with_capacity(module.aliases.len()),
      structs: Vec::with_capacity(module.structs.len()),
      unions: Vec::with_capacity(module.unions.len()),
      messages: Vec::with_capacity(module.messages.len()),
    };

    for def in &module.enums {
      let r = self.resolve_enum(def)?;
      debug!(module = %module.name, name = %def.name, base = %r.base, entries = r.entries.len(), "enum");
      resolved.enums.push(r);
    }
    for def in &module.aliases {
      let r = self.resolve_alias(def)?;
      debug!(module = %module.name, name = %def.name, target = %r.inner.type_name(), length = r.length, "alias");
      resolved.aliases.push(r);
    }
    for def in &module.structs {
      let r = self.resolve_struct(def)?;
      debug!(module = %module.name, name = %def.name, fields = r.fields.len(), size = ?r.static_size(), "struct");
      resolved.structs.push(r);
    }
    for def in &module.unions {
      let r = self.resolve_union(def)?;
      debug!(module = %module.name, name = %def.name, members = r.members.len(), size = r.size, "union");
      resolved.unions.push(r);
    }
    for def in &module.messages {
      let r = self.resolve_message(def)?;
      debug!(
        module = %module.name,
        name = %def.name,
        message_type = %r.message_type,
        fields = r.fields.len(),
        size = ?r.static_size(),
        "message"
      );
      resolved.messages.push(r);
    }

    Ok(resolved)
  }
}

/* Resolve one module against a registry holding it and its imports */
pub fn resolve_module(registry: &TypeRegistry, module: &Module) -> Result<ResolvedModule, ResolutionError> {
  TypeResolver::new(registry).resolve_module(module)
}

/* Resolve several modules sharing one resolver, so shared types resolve once */
pub fn resolve_modules<'m>(
  registry: &TypeRegistry,
  modules: impl IntoIterator<Item = &'m Module>,
) -> Result<Vec<ResolvedModule>, ResolutionError> {
  let mut resolver = TypeResolver::new(registry);
  modules.into_iter().map(|module| resolver.resolve_module(module)).collect()
}
