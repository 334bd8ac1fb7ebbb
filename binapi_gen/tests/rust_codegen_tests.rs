/* Rust Code Generation Tests
 *
 * These tests run the generator over the workspace schema modules and check
 * the emitted walks, type definitions and module layout.
 */

use binapi_gen::cmds::common::{LoadedSchema, load_schema};
use binapi_gen::codegen::rust::{RustCodeGenerator, RustCodeGeneratorOptions};
use std::fs;
use std::path::PathBuf;

fn load(file: &str) -> LoadedSchema {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemas").join(file);
    load_schema(&[path], &[]).expect("schema should load and resolve")
}

fn generate(schema: &LoadedSchema, module: &str) -> String {
    let generator = RustCodeGenerator::new(&schema.registry, RustCodeGeneratorOptions::default());
    let module = schema.resolved_module(module).unwrap();
    generator.generate_module(module).expect("generation should succeed")
}

fn assert_contains(code: &str, snippets: &[&str]) {
    for snippet in snippets {
        assert!(code.contains(snippet), "missing `{}` in:\n{}", snippet, code);
    }
}

#[test]
fn test_module_header_and_constants() {
    let schema = load("memif.api.yaml");
    let code = generate(&schema, "memif");
    assert!(code.starts_with("// Code generated by binapi-gen. DO NOT EDIT.\n// source: memif (version 3.0.0)\n"));
    assert_contains(
        &code,
        &[
            "use super::binapi_runtime::*;",
            "use super::ethernet_types::*;",
            "use super::interface_types::*;",
            "pub const MODULE_NAME: &str = \"memif\";",
            "pub const API_VERSION: &str = \"3.0.0\";",
            "pub const VERSION_CRC: u32 = 0x88dc56c9;",
            "(\"memif_create\", \"b1b25061\"),",
        ],
    );
}

#[test]
fn test_enum_generation() {
    let schema = load("memif.api.yaml");
    let code = generate(&schema, "memif");
    assert_contains(
        &code,
        &[
            "#[repr(transparent)]",
            "pub struct MemifRole(pub u32);",
            "pub const MEMIF_ROLE_API_SLAVE: MemifRole = MemifRole(1);",
            "1 => Some(\"MEMIF_ROLE_API_SLAVE\"),",
            "\"MEMIF_MODE_API_IP\" => Some(Self::MEMIF_MODE_API_IP),",
        ],
    );
}

#[test]
fn test_message_skips_internal_fields() {
    let schema = load("memif.api.yaml");
    let code = generate(&schema, "memif");
    assert_contains(
        &code,
        &[
            "pub struct MemifCreate {",
            "pub role: MemifRole,",
            "pub hw_addr: MacAddress,",
            "pub secret: String,",
            "const CRC: &'static str = \"b1b25061\";",
            "MessageType::Request",
        ],
    );
    let create = &code[code.find("pub struct MemifCreate {").unwrap()..];
    let create = &create[..create.find("pub struct MemifCreateReply").unwrap()];
    assert!(!create.contains("client_index"));
    assert!(!create.contains("vl_msg_id"));
    assert!(!create.contains("m.context"));
}

#[test]
fn test_message_walks() {
    let schema = load("memif.api.yaml");
    let code = generate(&schema, "memif");
    assert_contains(
        &code,
        &[
            "// field[1] m.role",
            "w.put_u32(m.role.0);",
            "w.put_fixed_string(&m.secret, 24);",
            "m.role = MemifRole(r.get_u32()?);",
            "m.secret = r.get_fixed_string(24)?;",
            "m.no_zero_copy = r.get_bool()?;",
            "return Err(EncodeError::BufferTooSmall { required, available: buf.len() });",
        ],
    );
}

#[test]
fn test_counted_arrays_and_variable_strings() {
    let schema = load("ip.api.yaml");
    let code = generate(&schema, "ip");
    assert_contains(
        &code,
        &[
            "/* limit: 32 */",
            "pub table_ids: Vec<u32>,",
            "size += 4 * m.table_ids.len();",
            "w.put_u32(u32::try_from(m.table_ids.len()).map_err(|_| EncodeError::CountOverflow { field: \"count\", count: m.table_ids.len() })?);",
            "m.table_ids = Vec::with_capacity((m.count as usize).min(r.remaining()));",
            "size += 4 + m.tag.len();",
            "w.put_string(&m.tag);",
            "m.tag = r.get_string()?;",
        ],
    );
}

#[test]
fn test_nested_structs_are_walked_inline() {
    let schema = load("ip.api.yaml");
    let code = generate(&schema, "ip");
    assert_contains(
        &code,
        &[
            "use super::interface_types::*;",
            "use super::ip_types::*;",
            "pub paths: Vec<FibPath>,",
            "// field[1] m.route",
            "// field[2] m.route.n_paths",
            "w.put_u8(u8::try_from(m.route.paths.len()).map_err(|_| EncodeError::CountOverflow { field: \"n_paths\", count: m.route.paths.len() })?);",
            "w.put_bytes(&m.route.prefix.address.un.data);",
            "r.read_into(&mut m.route.prefix.address.un.data)?;",
        ],
    );
}

#[test]
fn test_union_generation() {
    let schema = load("ip_types.api.yaml");
    let code = generate(&schema, "ip_types");
    assert_contains(
        &code,
        &[
            "pub struct AddressUnion {",
            "pub data: [u8; 16],",
            "pub const SIZE: usize = 16;",
            "pub fn new_ip4(value: Ip4Address) -> Self {",
            "pub fn set_ip6(&mut self, value: Ip6Address) {",
            "pub fn get_ip6(&self) -> Ip6Address {",
            "pub type Ip4Address = [u8; 4];",
            "pub type AddressWithPrefix = Prefix;",
        ],
    );
}

#[test]
fn test_union_views_can_be_disabled() {
    let schema = load("ip_types.api.yaml");
    let options = RustCodeGeneratorOptions { emit_union_views: false, ..Default::default() };
    let generator = RustCodeGenerator::new(&schema.registry, options);
    let code = generator.generate_module(schema.resolved_module("ip_types").unwrap()).unwrap();
    assert!(code.contains("pub struct AddressUnion {"));
    assert!(!code.contains("fn new_ip4"));
}

#[test]
fn test_emit_code_writes_module_tree() {
    let schema = load("memif.api.yaml");
    let dir = tempfile::tempdir().unwrap();
    let options = RustCodeGeneratorOptions { output_dir: dir.path().to_path_buf(), ..Default::default() };
    let generator = RustCodeGenerator::new(&schema.registry, options);
    let written = generator.emit_code(&schema.resolved).unwrap();

    assert_eq!(written.len(), 5);
    for name in ["memif.rs", "interface_types.rs", "ethernet_types.rs", "binapi_runtime.rs", "mod.rs"] {
        assert!(dir.path().join(name).exists(), "{} not written", name);
    }
    let mod_rs = fs::read_to_string(dir.path().join("mod.rs")).unwrap();
    assert!(mod_rs.contains("pub mod binapi_runtime;\npub mod ethernet_types;\npub mod interface_types;\npub mod memif;\n"));
    let runtime = fs::read_to_string(dir.path().join("binapi_runtime.rs")).unwrap();
    assert!(runtime.contains("pub trait Message"));
}

#[test]
fn test_structs_keep_skipped_members() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.api.yaml");
    fs::write(
        &path,
        r#"
name: session
structs:
  - name: session_key
    fields:
      - { name: context, type: u32 }
      - { name: type, type: u8 }
messages:
  - name: session_add
    crc: "0x00000001"
    fields:
      - { name: _vl_msg_id, type: u16 }
      - { name: context, type: u32 }
      - { name: key, type: session_key }
"#,
    )
    .unwrap();
    let schema = load_schema(&[path], &[]).unwrap();
    let code = generate(&schema, "session");

    assert_contains(
        &code,
        &["pub struct SessionKey {\n    /* not encoded */\n    pub context: u32,\n    pub r#type: u8,\n}"],
    );
    /* the walks still pass over it */
    assert_contains(&code, &["w.put_u8(m.key.r#type);", "m.key.r#type = r.get_u8()?;"]);
    assert!(!code.contains("m.key.context"));
    let add = &code[code.find("pub struct SessionAdd {").unwrap()..];
    assert!(!add[..add.find('}').unwrap()].contains("context"));
}
