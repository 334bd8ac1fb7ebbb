use binapi_types::Module;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::file::{load_module, SchemaFormat};

/* Import resolver for loading schema modules together with their imports */
pub struct ImportResolver {
    /* Files fully loaded so far */
    loaded_files: HashSet<PathBuf>,

    /* Files whose imports are still being processed, to detect cycles */
    in_progress: Vec<PathBuf>,

    /* Include directories for searching imports */
    include_dirs: Vec<PathBuf>,

    /* Loaded modules, dependencies before dependents */
    modules: Vec<Module>,

    /* Map from module name to the file it was loaded from */
    module_files: HashMap<String, PathBuf>,
}

impl ImportResolver {
    /* Create a new import resolver with the given include directories */
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashSet::new(),
            in_progress: Vec::new(),
            include_dirs,
            modules: Vec::new(),
            module_files: HashMap::new(),
        }
    }

    /* Resolve an imported module name relative to the importing file or the include directories */
    fn resolve_import_path(&self, module_name: &str, base_file: &Path) -> anyhow::Result<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(parent) = base_file.parent() {
            candidates.push(parent.to_path_buf());
        }
        candidates.extend(self.include_dirs.iter().cloned());

        for dir in &candidates {
            for ext in SchemaFormat::EXTENSIONS {
                for file_name in [format!("{module_name}.api.{ext}"), format!("{module_name}.{ext}")] {
                    let path = dir.join(&file_name);
                    if path.exists() {
                        return Ok(path.canonicalize()?);
                    }
                }
            }
        }

        anyhow::bail!(
            "Import '{}' not found relative to '{}' or in include directories",
            module_name,
            base_file.display()
        )
    }

    /* Load a schema file and recursively load its imports */
    pub fn load_file_with_imports(&mut self, file_path: &Path) -> anyhow::Result<()> {
        let canonical_path = file_path.canonicalize()?;

        if self.loaded_files.contains(&canonical_path) {
            debug!(file = %file_path.display(), "skipping already loaded schema file");
            return Ok(());
        }

        if let Some(pos) = self.in_progress.iter().position(|p| p == &canonical_path) {
            let mut chain: Vec<String> = self.in_progress[pos..]
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(canonical_path.display().to_string());
            anyhow::bail!("Circular import detected: {}", chain.join(" -> "));
        }

        info!(file = %file_path.display(), "loading schema file");
        let module = load_module(&canonical_path)?;
        debug!(
            module = %module.name,
            version = %module.version,
            imports = module.imports.len(),
            definitions = module.definition_count(),
            "parsed schema module"
        );

        if let Some(previous) = self.module_files.get(&module.name) {
            anyhow::bail!(
                "Module '{}' defined by both {} and {}",
                module.name,
                previous.display(),
                canonical_path.display()
            );
        }

        self.in_progress.push(canonical_path.clone());
        for import in &module.imports {
            debug!(module = %module.name, import = %import, "resolving import");
            let import_path = self.resolve_import_path(import, &canonical_path)?;
            self.load_file_with_imports(&import_path)?;
        }
        self.in_progress.pop();

        self.loaded_files.insert(canonical_path.clone());
        self.module_files.insert(module.name.clone(), canonical_path);
        self.modules.push(module);

        Ok(())
    }

    /* All loaded modules, imports before the modules importing them */
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /* File a module was loaded from */
    pub fn module_path(&self, name: &str) -> Option<&Path> {
        self.module_files.get(name).map(PathBuf::as_path)
    }

    /* Get the number of loaded files */
    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }
}
