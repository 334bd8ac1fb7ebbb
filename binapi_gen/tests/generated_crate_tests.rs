/* Generated Crate Tests
 *
 * These tests emit the workspace schema modules into a scratch Cargo project
 * and run `cargo test` on it, so the generated size, marshal and unmarshal
 * code is compiled and exercised against real values.
 */

use binapi_gen::cmds::common::load_schema;
use binapi_gen::codegen::rust::{RustCodeGenerator, RustCodeGeneratorOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/* Corner cases the workspace schemas do not reach */
const EDGE_SCHEMA: &str = r#"
name: edge
imports: [edge_types]
structs:
  - name: session
    fields:
      - { name: context, type: u32 }
      - { name: type, type: u8 }
      - { name: label, type: string }
  - name: hop
    fields:
      - { name: n_labels, type: u8 }
      - { name: labels, type: u32, array: true, size-from: n_labels }
unions:
  - name: endpoint
    fields:
      - { name: hint, type: fib_hint }
      - { name: name, type: string, length: 12 }
      - { name: raw, type: u8, length: 10 }
messages:
  - name: session_list
    crc: "0x5e55104e"
    fields:
      - { name: _vl_msg_id, type: u16 }
      - { name: context, type: u32 }
      - { name: n_sessions, type: i16 }
      - { name: sessions, type: session, array: true, size-from: n_sessions }
      - { name: n_hops, type: u8 }
      - { name: hops, type: hop, array: true, size-from: n_hops }
      - { name: pad, type: u32, length: 40 }
      - { name: peer, type: endpoint }
"#;

const FIB_HINT_SCHEMA: &str = r#"
name: edge_types
structs:
  - name: fib_hint
    fields:
      - { name: weight, type: u8 }
      - { name: preference, type: u16 }
"#;

const ROUNDTRIP_TESTS: &str = r#"
use binapi_generated::generated::binapi_runtime::{DecodeError, EncodeError, Message, MessageType};
use binapi_generated::generated::edge::{Endpoint, Hop, Session, SessionList};
use binapi_generated::generated::edge_types::FibHint;
use binapi_generated::generated::ip::{FibPath, IpRoute, IpRouteAddDel, IpTableDumpFilter};
use binapi_generated::generated::ip_types::{Address, AddressFamily, AddressUnion, Prefix};
use binapi_generated::generated::memif::{self, MemifCreate, MemifMode, MemifRole};

fn memif_create(secret: &str) -> MemifCreate {
    MemifCreate {
        role: MemifRole::MEMIF_ROLE_API_SLAVE,
        mode: MemifMode::MEMIF_MODE_API_IP,
        rx_queues: 2,
        tx_queues: 1,
        id: 7,
        socket_id: 3,
        ring_size: 1024,
        buffer_size: 2048,
        no_zero_copy: true,
        hw_addr: [2, 0, 0, 0, 0, 1],
        secret: secret.to_string(),
    }
}

fn ip_route(n_paths: u8, paths: Vec<FibPath>) -> IpRouteAddDel {
    IpRouteAddDel {
        is_add: true,
        is_multipath: false,
        route: IpRoute {
            table_id: 1,
            stats_index: 0,
            prefix: Prefix {
                address: Address { af: AddressFamily::ADDRESS_IP4, un: AddressUnion::new_ip4([10, 0, 0, 0]) },
                len: 8,
            },
            n_paths,
            paths,
        },
    }
}

fn fib_path(last: u8) -> FibPath {
    FibPath { sw_if_index: 5, weight: last, nh: AddressUnion::new_ip4([10, 0, 0, last]) }
}

#[test]
fn memif_create_round_trips() {
    let msg = memif_create("s3cr3t");
    assert_eq!(MemifCreate::NAME, "memif_create");
    assert_eq!(MemifCreate::CRC, "b1b25061");
    assert_eq!(msg.message_type(), MessageType::Request);
    assert_eq!(memif::MODULE_NAME, "memif");

    let bytes = msg.marshal().unwrap();
    assert_eq!(msg.size(), 55);
    assert_eq!(bytes.len(), 55);
    assert_eq!(&bytes[0..8], &[0, 0, 0, 1, 0, 0, 0, 1]);
    assert_eq!(&bytes[18..25], &[0, 0, 4, 0, 8, 0, 1]);
    assert_eq!(&bytes[31..37], b"s3cr3t");
    assert!(bytes[37..].iter().all(|&b| b == 0));
    assert_eq!(MemifCreate::unmarshal(&bytes).unwrap(), msg);
}

#[test]
fn memif_secret_fills_or_truncates_its_window() {
    let full = memif_create("abcdefghijklmnopqrstuvwx");
    let bytes = full.marshal().unwrap();
    assert_eq!(MemifCreate::unmarshal(&bytes).unwrap().secret, "abcdefghijklmnopqrstuvwx");

    let long = memif_create("abcdefghijklmnopqrstuvwxyz0123");
    let bytes = long.marshal().unwrap();
    assert_eq!(bytes.len(), 55);
    assert_eq!(MemifCreate::unmarshal(&bytes).unwrap().secret, "abcdefghijklmnopqrstuvwx");
}

#[test]
fn ip_route_count_follows_the_paths() {
    let msg = ip_route(99, vec![fib_path(1), fib_path(2)]);
    assert_eq!(msg.size(), 71);

    let bytes = msg.marshal().unwrap();
    assert_eq!(bytes.len(), 71);
    assert_eq!(bytes[28], 2);
    assert_eq!(&bytes[29..34], &[0, 0, 0, 5, 1]);
    assert_eq!(&bytes[34..38], &[10, 0, 0, 1]);

    let decoded = IpRouteAddDel::unmarshal(&bytes).unwrap();
    assert_eq!(decoded.route.n_paths, 2);
    assert_eq!(decoded, ip_route(2, vec![fib_path(1), fib_path(2)]));
}

#[test]
fn ip_route_reports_short_buffers_and_overflowing_counts() {
    let bytes = ip_route(0, vec![fib_path(1), fib_path(2)]).marshal().unwrap();
    assert_eq!(
        IpRouteAddDel::unmarshal(&bytes[..50]),
        Err(DecodeError::ShortBuffer { offset: 50, needed: 4, available: 0 })
    );

    let msg = ip_route(0, vec![fib_path(1)]);
    let mut small = [0u8; 10];
    assert_eq!(
        msg.marshal_into(&mut small),
        Err(EncodeError::BufferTooSmall { required: 50, available: 10 })
    );

    let many = ip_route(0, (0..256).map(|_| fib_path(1)).collect());
    assert_eq!(many.marshal(), Err(EncodeError::CountOverflow { field: "n_paths", count: 256 }));
}

#[test]
fn table_filter_backfills_count_and_reads_variable_tag() {
    let msg = IpTableDumpFilter { count: 0, table_ids: vec![1, 2, 3], tag: "main".to_string() };
    let bytes = msg.marshal().unwrap();
    assert_eq!(msg.size(), 24);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 3]);
    assert_eq!(&bytes[16..24], &[0, 0, 0, 4, b'm', b'a', b'i', b'n']);

    let decoded = IpTableDumpFilter::unmarshal(&bytes).unwrap();
    assert_eq!(decoded.count, 3);
    assert_eq!(decoded.table_ids, vec![1, 2, 3]);
    assert_eq!(decoded.tag, "main");

    /* a huge count with nothing behind it fails on the first element */
    assert_eq!(
        IpTableDumpFilter::unmarshal(&[0xff, 0xff, 0xff, 0xff]),
        Err(DecodeError::ShortBuffer { offset: 4, needed: 4, available: 0 })
    );
}

#[test]
fn address_union_views_share_one_region() {
    let mut un = AddressUnion::new_ip4([192, 168, 0, 1]);
    assert_eq!(&un.data[..4], &[192, 168, 0, 1]);
    assert!(un.data[4..].iter().all(|&b| b == 0));
    assert_eq!(un.get_ip4(), [192, 168, 0, 1]);

    un.set_ip6([0xfe; 16]);
    assert_eq!(un.get_ip4(), [0xfe; 4]);

    /* a shorter member leaves the tail alone */
    un.set_ip4([1, 2, 3, 4]);
    let ip6 = un.get_ip6();
    assert_eq!(&ip6[..4], &[1, 2, 3, 4]);
    assert_eq!(&ip6[4..], &[0xfe; 12]);
}

#[test]
fn union_members_of_every_kind() {
    assert_eq!(Endpoint::SIZE, 12);

    let ep = Endpoint::new_hint(FibHint { weight: 3, preference: 0x0102 });
    assert_eq!(&ep.data[..3], &[3, 1, 2]);
    assert_eq!(ep.get_hint(), FibHint { weight: 3, preference: 0x0102 });

    let ep = Endpoint::new_name("eth0".to_string());
    assert_eq!(ep.get_name(), "eth0");

    let ep = Endpoint::new_raw([9; 10]);
    assert_eq!(ep.get_raw(), [9; 10]);
    assert_eq!(&ep.data[10..], &[0, 0]);
}

#[test]
fn nested_counts_keywords_and_skipped_members() {
    let msg = SessionList {
        n_sessions: -1,
        sessions: vec![
            Session { context: 7, r#type: 1, label: "a".to_string() },
            Session { context: 7, r#type: 2, label: "bc".to_string() },
        ],
        n_hops: 0,
        hops: vec![Hop { n_labels: 0, labels: vec![16, 17, 18] }],
        pad: vec![9],
        peer: Endpoint::new_raw([1; 10]),
    };

    /* 2 + (1 + 4 + 1) + (1 + 4 + 2) + 1 + (1 + 12) + 160 + 12 */
    let bytes = msg.marshal().unwrap();
    assert_eq!(msg.size(), 201);
    assert_eq!(bytes.len(), 201);
    assert_eq!(&bytes[0..3], &[0, 2, 1]);

    let decoded = SessionList::unmarshal(&bytes).unwrap();
    assert_eq!(decoded.n_sessions, 2);
    assert_eq!(decoded.sessions[0].context, 0);
    assert_eq!(decoded.sessions[1].r#type, 2);
    assert_eq!(decoded.sessions[1].label, "bc");
    assert_eq!(decoded.n_hops, 1);
    assert_eq!(decoded.hops[0].n_labels, 3);
    assert_eq!(decoded.hops[0].labels, vec![16, 17, 18]);
    assert_eq!(decoded.pad.len(), 40);
    assert_eq!(decoded.pad[0], 9);
    assert!(decoded.pad[1..].iter().all(|&v| v == 0));
    assert_eq!(decoded.peer, msg.peer);
    assert_eq!(decoded.marshal().unwrap(), bytes);
}
"#;

fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemas")
}

/* Helper to emit the schemas into a Cargo project and run its tests */
fn run_generated_tests(project_dir: &Path, files: &[PathBuf], tests: &str) -> Result<(), String> {
    let schema = load_schema(files, &[schema_dir()]).map_err(|e| format!("Failed to load schema: {:#}", e))?;

    let generated_dir = project_dir.join("src").join("generated");
    let options = RustCodeGeneratorOptions { output_dir: generated_dir, ..Default::default() };
    RustCodeGenerator::new(&schema.registry, options)
        .emit_code(&schema.resolved)
        .map_err(|e| format!("Failed to emit code: {:#}", e))?;

    /* Empty workspace table keeps the project out of any enclosing workspace */
    let cargo_toml = r#"[package]
name = "binapi_generated"
version = "0.1.0"
edition = "2021"

[lib]
path = "src/lib.rs"

[workspace]
"#;
    fs::write(project_dir.join("Cargo.toml"), cargo_toml)
        .map_err(|e| format!("Failed to write Cargo.toml: {}", e))?;
    fs::write(project_dir.join("src").join("lib.rs"), "#![allow(dead_code, unused)]\n\npub mod generated;\n")
        .map_err(|e| format!("Failed to write lib.rs: {}", e))?;

    let tests_dir = project_dir.join("tests");
    fs::create_dir_all(&tests_dir).map_err(|e| format!("Failed to create tests dir: {}", e))?;
    fs::write(tests_dir.join("roundtrip.rs"), tests).map_err(|e| format!("Failed to write tests: {}", e))?;

    let output = Command::new("cargo")
        .arg("test")
        .arg("--manifest-path")
        .arg(project_dir.join("Cargo.toml"))
        .output()
        .map_err(|e| format!("Failed to run cargo: {}", e))?;

    if !output.status.success() {
        return Err(format!(
            "Generated crate tests failed:\n{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

#[test]
fn test_generated_code_compiles_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let edge = dir.path().join("edge.api.yaml");
    fs::write(&edge, EDGE_SCHEMA).unwrap();
    fs::write(dir.path().join("edge_types.api.yaml"), FIB_HINT_SCHEMA).unwrap();

    let project_dir = dir.path().join("project");
    let files = vec![schema_dir().join("memif.api.yaml"), schema_dir().join("ip.api.yaml"), edge];
    if let Err(e) = run_generated_tests(&project_dir, &files, ROUNDTRIP_TESTS) {
        panic!("{}", e);
    }
}
