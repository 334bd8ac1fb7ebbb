use crate::codegen::rust_gen::helpers::CodeWriter;
use crate::codegen::rust_gen::{
  RUNTIME_MODULE, RUNTIME_MODULE_NAME, emit_alias, emit_enum, emit_message, emit_struct, emit_union,
};
use crate::schema::{ResolvedField, ResolvedModule, ResolvedType, TypeRegistry};
use anyhow::Context;
use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct RustCodeGeneratorOptions {
  pub output_dir: PathBuf,
  /* Write binapi_runtime.rs next to the modules */
  pub emit_runtime: bool,
  /* Emit new_/set_/get_ member views on unions */
  pub emit_union_views: bool,
  /* Emit MODULE_NAME, API_VERSION and VERSION_CRC */
  pub emit_version_constants: bool,
}

impl Default for RustCodeGeneratorOptions {
  fn default() -> Self {
    Self {
      output_dir: PathBuf::from(super::OUTPUT_DIR),
      emit_runtime: true,
      emit_union_views: true,
      emit_version_constants: true,
    }
  }
}

pub struct RustCodeGenerator<'a> {
  registry: &'a TypeRegistry,
  options: RustCodeGeneratorOptions,
}

impl<'a> RustCodeGenerator<'a> {
  pub fn new(registry: &'a TypeRegistry, options: RustCodeGeneratorOptions) -> Self {
    Self { registry, options }
  }

  pub fn options(&self) -> &RustCodeGeneratorOptions {
    &self.options
  }

  /* Write one file per module, the runtime module and mod.rs; returns the written paths */
  pub fn emit_code(&self, modules: &[ResolvedModule]) -> anyhow::Result<Vec<PathBuf>> {
    let output_dir = &self.options.output_dir;
    fs::create_dir_all(output_dir)
      .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let mut written = Vec::new();
    for module in modules {
      let source = self
        .generate_module(module)
        .with_context(|| format!("failed to generate module {}", module.name))?;
      let path = output_dir.join(format!("{}.rs", module.name));
      fs::write(&path, source).with_context(|| format!("failed to write {}", path.display()))?;
      info!(module = %module.name, path = %path.display(), "wrote module");
      written.push(path);
    }

    if self.options.emit_runtime {
      let path = output_dir.join(format!("{}.rs", RUNTIME_MODULE_NAME));
      fs::write(&path, get_runtime_module_content())
        .with_context(|| format!("failed to write {}", path.display()))?;
      info!(path = %path.display(), "wrote runtime module");
      written.push(path);
    }

    let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
    let path = output_dir.join("mod.rs");
    fs::write(&path, generate_mod_file(&names, self.options.emit_runtime))
      .with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);

    Ok(written)
  }

  /* Complete source text of one generated module */
  pub fn generate_module(&self, module: &ResolvedModule) -> Result<String, fmt::Error> {
    let mut output = String::new();
    self.emit_header(&mut output, module)?;

    writeln!(output, "use super::{}::*;", RUNTIME_MODULE_NAME)?;
    for dependency in self.module_dependencies(module) {
      writeln!(output, "use super::{}::*;", dependency)?;
    }
    writeln!(output)?;

    if self.options.emit_version_constants {
      emit_version_constants(&mut output, module)?;
    }

    for def in &module.enums {
      debug!(name = %def.name, "emitting enum");
      emit_enum(&mut output, def)?;
      writeln!(output)?;
    }
    for def in &module.aliases {
      debug!(name = %def.name, "emitting alias");
      emit_alias(&mut output, def)?;
      writeln!(output)?;
    }
    for def in &module.structs {
      debug!(name = %def.name, "emitting struct");
      emit_struct(&mut output, def)?;
      writeln!(output)?;
    }
    for def in &module.unions {
      debug!(name = %def.name, size = def.size, "emitting union");
      emit_union(&mut output, def, self.options.emit_union_views)?;
      writeln!(output)?;
    }
    for msg in &module.messages {
      debug!(name = %msg.name, message_type = %msg.message_type, "emitting message");
      emit_message(&mut output, msg)?;
      writeln!(output)?;
    }

    emit_message_list(&mut output, module)?;
    Ok(output)
  }

  /* Other modules owning types this module names, directly or through inlined walks */
  pub fn module_dependencies(&self, module: &ResolvedModule) -> BTreeSet<String> {
    let mut owners = BTreeSet::new();
    for def in &module.aliases {
      self.collect_type(&def.inner, &mut owners);
    }
    /* Struct definitions name skipped members too */
    for field in module.structs.iter().flat_map(|def| &def.fields) {
      self.collect_type(&field.ty, &mut owners);
    }
    for def in &module.unions {
      self.collect_fields(&def.members, &mut owners);
    }
    for msg in &module.messages {
      self.collect_fields(&msg.fields, &mut owners);
    }
    owners.remove(&module.name);
    owners
  }

  fn collect_fields(&self, fields: &[ResolvedField], owners: &mut BTreeSet<String>) {
    for field in fields.iter().filter(|f| f.is_encoded()) {
      self.collect_type(&field.ty, owners);
    }
  }

  fn collect_type(&self, ty: &ResolvedType, owners: &mut BTreeSet<String>) {
    let name = match ty {
      ResolvedType::Base(_) | ResolvedType::String(_) => return,
      ResolvedType::Enum(def) => &def.name,
      ResolvedType::Union(def) => &def.name,
      ResolvedType::Alias(def) => {
        self.collect_type(&def.inner, owners);
        &def.name
      }
      ResolvedType::Struct(def) => {
        self.collect_fields(&def.fields, owners);
        &def.name
      }
    };
    if let Some(owner) = self.registry.owner_of(name) {
      owners.insert(owner.to_string());
    }
  }

  fn emit_header(&self, output: &mut String, module: &ResolvedModule) -> fmt::Result {
    writeln!(output, "// Code generated by binapi-gen. DO NOT EDIT.")?;
    if module.version.is_empty() {
      writeln!(output, "// source: {}", module.name)?;
    } else {
      writeln!(output, "// source: {} (version {})", module.name, module.version)?;
    }

    let counts = [
      (module.aliases.len(), "aliases"),
      (module.enums.len(), "enums"),
      (module.messages.len(), "messages"),
      (module.structs.len(), "types"),
      (module.unions.len(), "unions"),
    ];
    if counts.iter().any(|(n, _)| *n > 0) {
      writeln!(output, "//")?;
      writeln!(output, "// It consists of:")?;
      for (count, label) in counts.iter().filter(|(n, _)| *n > 0) {
        writeln!(output, "//   {:3} {}", count, label)?;
      }
    }
    writeln!(output)?;
    writeln!(
      output,
      "#![allow(unused_imports, unused_mut, unused_variables, unused_assignments, clippy::all)]"
    )?;
    writeln!(output)
  }
}

fn emit_version_constants(output: &mut String, module: &ResolvedModule) -> fmt::Result {
  writeln!(output, "/// Name of this module.")?;
  writeln!(output, "pub const MODULE_NAME: &str = \"{}\";", module.name)?;
  writeln!(output, "/// API version of this module.")?;
  writeln!(output, "pub const API_VERSION: &str = \"{}\";", module.version)?;
  if let Some(crc) = parse_crc(&module.crc) {
    writeln!(output, "/// CRC of this module.")?;
    writeln!(output, "pub const VERSION_CRC: u32 = 0x{:08x};", crc)?;
  }
  writeln!(output)
}

fn emit_message_list(output: &mut String, module: &ResolvedModule) -> fmt::Result {
  let mut w = CodeWriter::new(output, 0);
  w.line("/// Name and CRC of every message in this module.")?;
  if module.messages.is_empty() {
    return w.line("pub const MESSAGES: &[(&str, &str)] = &[];");
  }
  w.open("pub const MESSAGES: &[(&str, &str)] = &[")?;
  for msg in &module.messages {
    w.line(format!("(\"{}\", \"{}\"),", msg.name, msg.crc_string()))?;
  }
  w.close("];")
}

/* "0x88dc56c9" -> 0x88dc56c9 */
pub fn parse_crc(crc: &str) -> Option<u32> {
  let digits = crc.strip_prefix("0x").unwrap_or(crc);
  if digits.is_empty() {
    return None;
  }
  u32::from_str_radix(digits, 16).ok()
}

pub fn get_runtime_module_content() -> &'static str {
  RUNTIME_MODULE
}

/* mod.rs declaring every generated module */
pub fn generate_mod_file(module_names: &[&str], with_runtime: bool) -> String {
  let mut names: Vec<&str> = module_names.to_vec();
  if with_runtime {
    names.push(RUNTIME_MODULE_NAME);
  }
  names.sort_unstable();
  names.dedup();

  let mut output = String::from("// Code generated by binapi-gen. DO NOT EDIT.\n\n");
  for name in names {
    output.push_str(&format!("pub mod {};\n", name));
  }
  output
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn crc_parsing() {
    assert_eq!(parse_crc("0x88dc56c9"), Some(0x88dc56c9));
    assert_eq!(parse_crc("b1b25061"), Some(0xb1b25061));
    assert_eq!(parse_crc(""), None);
    assert_eq!(parse_crc("0xnothex"), None);
  }

  #[test]
  fn mod_file_lists_modules_sorted() {
    let text = generate_mod_file(&["memif", "ip_types"], true);
    assert!(text.ends_with("pub mod binapi_runtime;\npub mod ip_types;\npub mod memif;\n"));
  }
}
