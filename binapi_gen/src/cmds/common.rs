/* Common utilities shared between analyze and codegen commands */

use crate::schema::{ResolvedModule, TypeRegistry, resolve_modules};
use binapi_loader::ImportResolver;
use binapi_types::Module;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/* Modules loaded from a set of input files together with everything they import */
pub struct LoadedSchema {
  /* Dependency order: imports precede their importers */
  pub modules: Vec<Module>,
  pub registry: TypeRegistry,
  pub resolved: Vec<ResolvedModule>,
  /* Names of the modules given on the command line */
  pub roots: Vec<String>,
}

impl LoadedSchema {
  pub fn resolved_module(&self, name: &str) -> Option<&ResolvedModule> {
    self.resolved.iter().find(|m| m.name == name)
  }

  pub fn root_modules(&self) -> impl Iterator<Item = &ResolvedModule> {
    self.resolved.iter().filter(|m| self.roots.contains(&m.name))
  }
}

/* Route tracing output to stderr; RUST_LOG overrides the level picked by `verbose` */
pub fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  /* A second initialization (tests, embedding binaries) keeps the first subscriber */
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/* Load files with their imports, register every definition and resolve all modules */
pub fn load_schema(files: &[PathBuf], include_dirs: &[PathBuf]) -> anyhow::Result<LoadedSchema> {
  if files.is_empty() {
    anyhow::bail!("No input files given");
  }

  let mut resolver = ImportResolver::new(include_dirs.to_vec());
  for file in files {
    resolver.load_file_with_imports(file)?;
  }
  info!(files = resolver.loaded_file_count(), "loaded schema files");

  let roots = root_module_names(&resolver, files);
  let modules = resolver.into_modules();

  let registry = TypeRegistry::from_modules(&modules)
    .map_err(|e| anyhow::anyhow!("Type registration failed: {}", e))?;
  debug!(types = registry.type_count(), "registered types");

  let resolved = resolve_modules(&registry, &modules)
    .map_err(|e| anyhow::anyhow!("Type resolution failed: {}", e))?;

  Ok(LoadedSchema { modules, registry, resolved, roots })
}

fn root_module_names(resolver: &ImportResolver, files: &[PathBuf]) -> Vec<String> {
  let mut roots = Vec::new();
  for file in files {
    let Ok(canonical) = file.canonicalize() else {
      continue;
    };
    let name = resolver
      .modules()
      .iter()
      .find(|m| resolver.module_path(&m.name) == Some(canonical.as_path()))
      .map(|m| m.name.clone());
    if let Some(name) = name {
      if !roots.contains(&name) {
        roots.push(name);
      }
    }
  }
  roots
}
