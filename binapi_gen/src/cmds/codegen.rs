/* Codegen command - generate Rust sources from binary API schema modules */

use super::common::load_schema;
use crate::codegen::rust::{RustCodeGenerator, RustCodeGeneratorOptions};
use std::path::PathBuf;

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  output_dir: PathBuf,
  no_runtime: bool,
  no_union_views: bool,
  verbose: bool,
) -> anyhow::Result<()> {
  if verbose {
    println!("Binary API Generator - Code Generation Tool");
    println!("===========================================\n");
    println!("[~] Configuration:");
    println!("  Output directory: {}", output_dir.display());
    println!("  Input files: {}", files.len());
    for file in &files {
      println!("    - {}", file.display());
    }
    if !include_dirs.is_empty() {
      println!("  Include directories: {}", include_dirs.len());
      for dir in &include_dirs {
        println!("    - {}", dir.display());
      }
    }
    println!();
  }

  let schema = load_schema(&files, &include_dirs)?;

  if verbose {
    println!("[~] Modules loaded (including imports):");
    for module in &schema.resolved {
      println!(
        "    - {} ({} types, {} messages)",
        module.name,
        module.type_count(),
        module.messages.len()
      );
    }
    println!();
  }

  let options = RustCodeGeneratorOptions {
    output_dir: output_dir.clone(),
    emit_runtime: !no_runtime,
    emit_union_views: !no_union_views,
    ..RustCodeGeneratorOptions::default()
  };
  let generator = RustCodeGenerator::new(&schema.registry, options);
  let written = generator.emit_code(&schema.resolved)?;

  if verbose {
    println!("[✓] Generated Rust code:");
    for path in &written {
      println!("    - {}", path.display());
    }
  } else {
    println!("[✓] Generated {} file(s) in {}", written.len(), output_dir.display());
  }

  Ok(())
}
