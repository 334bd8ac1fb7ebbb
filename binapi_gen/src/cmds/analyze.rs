/* Analyze command - per-module report of resolved sizes, classification and field roles */

use super::common::{LoadedSchema, load_schema};
use crate::schema::{
  FieldRole, FieldShape, MessageType, ResolvedField, ResolvedMessage, ResolvedModule,
};
use clap::ValueEnum;
use serde_derive::Serialize;
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ReportFormat {
  Text,
  Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
  pub name: String,
  pub version: String,
  pub crc: String,
  pub imports: Vec<String>,
  pub types: Vec<TypeReport>,
  pub messages: Vec<MessageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeReport {
  pub name: String,
  pub kind: &'static str,
  /* None when the wire size depends on runtime values */
  pub size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
  pub name: String,
  pub crc: String,
  pub message_type: MessageType,
  pub size: Option<usize>,
  pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
  pub name: String,
  #[serde(rename = "type")]
  pub type_name: String,
  pub shape: String,
  pub role: String,
}

/* Execute the analyze command */
pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  all_modules: bool,
  message: Option<String>,
  format: ReportFormat,
) -> anyhow::Result<()> {
  let schema = load_schema(&files, &include_dirs)?;
  let reports = build_reports(&schema, all_modules);

  if let Some(name) = message {
    let report = reports
      .iter()
      .flat_map(|m| m.messages.iter())
      .find(|m| m.name == name)
      .ok_or_else(|| anyhow::anyhow!("Message '{}' not found", name))?;
    match format {
      ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
      ReportFormat::Text => print_message(report),
    }
    return Ok(());
  }

  match format {
    ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    ReportFormat::Text => {
      println!("Binary API Generator - Schema Analysis");
      println!("======================================\n");
      for report in &reports {
        print_module(report);
      }
    }
  }
  Ok(())
}

/* Reports for the modules named on the command line, or every loaded module */
pub fn build_reports(schema: &LoadedSchema, all_modules: bool) -> Vec<ModuleReport> {
  if all_modules {
    schema.resolved.iter().map(module_report).collect()
  } else {
    schema.root_modules().map(module_report).collect()
  }
}

pub fn module_report(module: &ResolvedModule) -> ModuleReport {
  let mut types = Vec::with_capacity(module.type_count());
  for def in &module.enums {
    types.push(TypeReport { name: def.name.clone(), kind: "enum", size: def.base.wire_size() });
  }
  for def in &module.aliases {
    types.push(TypeReport { name: def.name.clone(), kind: "alias", size: def.static_size() });
  }
  for def in &module.structs {
    types.push(TypeReport { name: def.name.clone(), kind: "struct", size: def.static_size() });
  }
  for def in &module.unions {
    types.push(TypeReport { name: def.name.clone(), kind: "union", size: Some(def.size) });
  }

  ModuleReport {
    name: module.name.clone(),
    version: module.version.clone(),
    crc: module.crc.clone(),
    imports: module.imports.clone(),
    types,
    messages: module.messages.iter().map(message_report).collect(),
  }
}

pub fn message_report(msg: &ResolvedMessage) -> MessageReport {
  MessageReport {
    name: msg.name.clone(),
    crc: msg.crc.clone(),
    message_type: msg.message_type,
    size: msg.static_size(),
    fields: msg.fields.iter().map(field_report).collect(),
  }
}

fn field_report(field: &ResolvedField) -> FieldReport {
  let shape = match &field.shape {
    FieldShape::Scalar => "scalar".to_string(),
    FieldShape::Fixed(len) => format!("[{}]", len),
    FieldShape::Counted { count_field } => format!("[{}]", count_field),
  };
  let role = match &field.role {
    FieldRole::Data => "data".to_string(),
    FieldRole::Skipped => "skipped".to_string(),
    FieldRole::CountOf(array) => format!("count of {}", array),
  };
  FieldReport { name: field.name.clone(), type_name: field.ty.type_name(), shape, role }
}

fn format_size(size: Option<usize>) -> String {
  match size {
    Some(size) => format!("{} bytes", size),
    None => "variable".to_string(),
  }
}

fn print_module(report: &ModuleReport) {
  if report.version.is_empty() {
    println!("[~] Module: {}", report.name);
  } else {
    println!("[~] Module: {} (version {})", report.name, report.version);
  }
  if !report.imports.is_empty() {
    println!("    Imports: {}", report.imports.join(", "));
  }

  if !report.types.is_empty() {
    println!("    Types:");
    for ty in &report.types {
      println!("      - {:<24} {:<7} {}", ty.name, ty.kind, format_size(ty.size));
    }
  }

  if !report.messages.is_empty() {
    println!("    Messages:");
    for msg in &report.messages {
      println!(
        "      - {:<32} {:<8} {:<10} crc {}",
        msg.name,
        msg.message_type.as_str(),
        format_size(msg.size),
        msg.crc
      );
    }
  }
  println!();
}

fn print_message(report: &MessageReport) {
  println!("[~] Message: {}", report.name);
  println!("    Type: {}", report.message_type);
  println!("    CRC:  {}", report.crc);
  println!("    Size: {}", format_size(report.size));
  println!("    Fields:");
  for field in &report.fields {
    println!(
      "      - {:<20} {:<20} {:<12} {}",
      field.name, field.type_name, field.shape, field.role
    );
  }
}
