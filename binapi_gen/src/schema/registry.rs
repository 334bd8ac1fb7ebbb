use super::errors::ResolutionError;
use binapi_types::{AliasDef, BaseType, EnumDef, Module, StructDef, UnionDef};
use indexmap::IndexMap;

/* What a type reference names, in lookup order */
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeClass<'a> {
  Base(BaseType),
  Enum(&'a EnumDef),
  Alias(&'a AliasDef),
  Struct(&'a StructDef),
  Union(&'a UnionDef),
}

impl TypeClass<'_> {
  pub fn kind_name(&self) -> &'static str {
    match self {
      TypeClass::Base(_) => "base",
      TypeClass::Enum(_) => "enum",
      TypeClass::Alias(_) => "alias",
      TypeClass::Struct(_) => "struct",
      TypeClass::Union(_) => "union",
    }
  }
}

/* Read-only index of every named type across a set of modules.
 *
 * Built once per loaded schema and passed by reference to the resolver.
 * Each type name is unique across all kinds and modules.
 */
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
  enums: IndexMap<String, EnumDef>,
  aliases: IndexMap<String, AliasDef>,
  structs: IndexMap<String, StructDef>,
  unions: IndexMap<String, UnionDef>,
  /* type name -> owning module */
  owners: IndexMap<String, String>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_modules<'m>(modules: impl IntoIterator<Item = &'m Module>) -> Result<Self, ResolutionError> {
    let mut registry = Self::new();
    for module in modules {
      registry.add_module(module)?;
    }
    Ok(registry)
  }

  /* Index every type a module defines */
  pub fn add_module(&mut self, module: &Module) -> Result<(), ResolutionError> {
    for name in module.type_names() {
      self.claim(name, &module.name)?;
    }
    for def in &module.enums {
      self.enums.insert(def.name.clone(), def.clone());
    }
    for def in &module.aliases {
      self.aliases.insert(def.name.clone(), def.clone());
    }
    for def in &module.structs {
      self.structs.insert(def.name.clone(), def.clone());
    }
    for def in &module.unions {
      self.unions.insert(def.name.clone(), def.clone());
    }
    Ok(())
  }

  fn claim(&mut self, name: &str, module: &str) -> Result<(), ResolutionError> {
    if BaseType::from_name(name).is_some() {
      return Err(ResolutionError::DuplicateType {
        name: name.to_string(),
        first: "<base>".to_string(),
        second: module.to_string(),
      });
    }
    if let Some(first) = self.owners.get(name) {
      return Err(ResolutionError::DuplicateType {
        name: name.to_string(),
        first: first.clone(),
        second: module.to_string(),
      });
    }
    self.owners.insert(name.to_string(), module.to_string());
    Ok(())
  }

  pub fn lookup(&self, type_ref: &str) -> Option<TypeClass<'_>> {
    if let Some(base) = BaseType::from_name(type_ref) {
      return Some(TypeClass::Base(base));
    }
    if let Some(def) = self.enums.get(type_ref) {
      return Some(TypeClass::Enum(def));
    }
    if let Some(def) = self.aliases.get(type_ref) {
      return Some(TypeClass::Alias(def));
    }
    if let Some(def) = self.structs.get(type_ref) {
      return Some(TypeClass::Struct(def));
    }
    self.unions.get(type_ref).map(TypeClass::Union)
  }

  pub fn resolve(&self, type_ref: &str) -> Result<TypeClass<'_>, ResolutionError> {
    self.lookup(type_ref).ok_or_else(|| ResolutionError::UnknownType {
      type_ref: type_ref.to_string(),
      referenced_by: None,
    })
  }

  /* Module that defines a named type */
  pub fn owner_of(&self, type_name: &str) -> Option<&str> {
    self.owners.get(type_name).map(String::as_str)
  }

  pub fn type_count(&self) -> usize {
    self.owners.len()
  }

  pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
    self.enums.values()
  }

  pub fn aliases(&self) -> impl Iterator<Item = &AliasDef> {
    self.aliases.values()
  }

  pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
    self.structs.values()
  }

  pub fn unions(&self) -> impl Iterator<Item = &UnionDef> {
    self.unions.values()
  }
}
