use assert_matches::assert_matches;
use binapi_gen::schema::{resolve_modules, TypeRegistry};
use binapi_reflect::{Codec, CodecError, StructValue, UnionValue, Value};
use binapi_types::Module;

/* Build a codec over inline YAML modules; later modules may use earlier ones */
fn codec(yamls: &[&str]) -> Codec {
    let modules: Vec<Module> = yamls
        .iter()
        .map(|yaml| serde_yml::from_str(yaml).expect("valid schema"))
        .collect();
    let registry = TypeRegistry::from_modules(&modules).expect("registry");
    let resolved = resolve_modules(&registry, &modules).expect("resolution");
    Codec::from_modules(&resolved)
}

const MEMIF: &str = r#"
name: memif
enums:
  - name: memif_role
    type: u32
    entries:
      - { name: MEMIF_ROLE_API_MASTER, value: 0 }
      - { name: MEMIF_ROLE_API_SLAVE, value: 1 }
messages:
  - name: memif_create
    crc: "0xb1b25061"
    fields:
      - { name: _vl_msg_id, type: u16 }
      - { name: client_index, type: u32 }
      - { name: context, type: u32 }
      - { name: role, type: memif_role }
      - { name: rx_queues, type: u8 }
      - { name: secret, type: string, length: 24 }
"#;

const TABLES: &str = r#"
name: tables
structs:
  - name: entry
    fields:
      - { name: id, type: u16 }
      - { name: label, type: string }
messages:
  - name: table_add
    fields:
      - { name: _vl_msg_id, type: u16 }
      - { name: client_index, type: u32 }
      - { name: context, type: u32 }
      - { name: n_ids, type: u8 }
      - { name: ids, type: u32, array: true, size-from: n_ids }
      - { name: tag, type: string }
  - name: entry_dump
    fields:
      - { name: _vl_msg_id, type: u16 }
      - { name: context, type: u32 }
      - { name: count, type: u16 }
      - { name: entries, type: entry, array: true, size-from: count }
      - { name: mask, type: u8, length: 4 }
"#;

const UNIONS: &str = r#"
name: unions
aliases:
  - { name: ip4_address, type: u8, length: 4 }
  - { name: mac_address, type: u8, length: 6 }
unions:
  - name: blob
    fields:
      - { name: ip4, type: ip4_address }
      - { name: mac, type: mac_address }
      - { name: name, type: string, length: 24 }
  - name: word
    fields:
      - { name: value, type: u32 }
      - { name: half, type: u16 }
structs:
  - name: holder
    fields:
      - { name: kind, type: u8 }
      - { name: data, type: word }
"#;

fn memif_create(role: i64, rx_queues: u8, secret: &str) -> Value {
    Value::Struct(
        StructValue::new()
            .with("role", Value::enum_value("memif_role", role))
            .with("rx_queues", rx_queues)
            .with("secret", secret),
    )
}

#[test]
fn test_concrete_memif_create_encoding() {
    let codec = codec(&[MEMIF]);
    let value = memif_create(1, 2, "abc");

    assert_eq!(codec.size("memif_create", &value).unwrap(), 29);
    let bytes = codec.encode("memif_create", &value).unwrap();
    assert_eq!(bytes.len(), 29);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
    assert_eq!(bytes[4], 2);
    assert_eq!(&bytes[5..8], b"abc");
    assert!(bytes[8..29].iter().all(|&b| b == 0));

    assert_eq!(codec.decode("memif_create", &bytes).unwrap(), value);
}

#[test]
fn test_fixed_string_filling_its_window_decodes_whole() {
    let codec = codec(&[MEMIF]);
    let secret = "abcdefghijklmnopqrstuvwx";
    let bytes = codec.encode("memif_create", &memif_create(0, 1, secret)).unwrap();
    assert!(!bytes[5..].contains(&0));

    let decoded = codec.decode("memif_create", &bytes).unwrap();
    assert_eq!(decoded.as_struct().unwrap().get("secret"), Some(&Value::from(secret)));
}

#[test]
fn test_fixed_string_longer_than_window_is_truncated() {
    let codec = codec(&[MEMIF]);
    let long = "x".repeat(30);
    let bytes = codec.encode("memif_create", &memif_create(0, 1, &long)).unwrap();
    assert_eq!(bytes.len(), 29);

    let decoded = codec.decode("memif_create", &bytes).unwrap();
    assert_eq!(
        decoded.as_struct().unwrap().get("secret"),
        Some(&Value::from("x".repeat(24)))
    );
}

#[test]
fn test_count_field_follows_the_array() {
    let codec = codec(&[TABLES]);
    let value = Value::Struct(
        StructValue::new()
            .with("n_ids", 9u8)
            .with("ids", vec![Value::U32(10), Value::U32(20), Value::U32(30)])
            .with("tag", "t1"),
    );

    let bytes = codec.encode("table_add", &value).unwrap();
    /* n_ids 1 + ids 3 * 4 + tag 4 + 2 */
    assert_eq!(bytes.len(), 19);
    assert_eq!(bytes[0], 3);
    assert_eq!(&bytes[1..5], &[0, 0, 0, 10]);
    assert_eq!(&bytes[13..19], &[0, 0, 0, 2, b't', b'1']);

    let decoded = codec.decode("table_add", &bytes).unwrap();
    let fields = decoded.as_struct().unwrap();
    assert_eq!(fields.get("n_ids"), Some(&Value::U8(3)));
    assert_eq!(fields.get("ids").and_then(Value::as_array).map(<[Value]>::len), Some(3));
}

#[test]
fn test_count_field_may_be_omitted() {
    let codec = codec(&[TABLES]);
    let value = Value::Struct(
        StructValue::new()
            .with("ids", vec![Value::U32(1)])
            .with("tag", ""),
    );
    assert_eq!(codec.encode("table_add", &value).unwrap(), vec![1, 0, 0, 0, 1, 0, 0, 0, 0]);
}

#[test]
fn test_count_that_does_not_fit_its_field_is_rejected() {
    let codec = codec(&[TABLES]);
    let value = Value::Struct(
        StructValue::new()
            .with("ids", vec![Value::U32(0); 256])
            .with("tag", ""),
    );
    assert_matches!(
        codec.size("table_add", &value),
        Err(CodecError::OutOfRange { ref path, .. }) if path == "table_add.n_ids"
    );
}

#[test]
fn test_nested_struct_arrays_round_trip() {
    let codec = codec(&[TABLES]);
    let entry = |id: u16, label: &str| {
        Value::Struct(StructValue::new().with("id", id).with("label", label))
    };
    let value = Value::Struct(
        StructValue::new()
            .with("count", 2u16)
            .with("entries", vec![entry(1, "a"), entry(2, "bc")])
            .with("mask", vec![Value::U8(1), Value::U8(2), Value::U8(3), Value::U8(4)]),
    );

    let size = codec.size("entry_dump", &value).unwrap();
    let bytes = codec.encode("entry_dump", &value).unwrap();
    assert_eq!(bytes.len(), size);
    /* count 2 + (2 + 4 + 1) + (2 + 4 + 2) + mask 4 */
    assert_eq!(size, 21);
    assert_eq!(codec.decode("entry_dump", &bytes).unwrap(), value);
}

#[test]
fn test_fixed_arrays_pad_and_ignore_extra_elements() {
    let codec = codec(&[TABLES]);
    let value = |mask: Vec<Value>| {
        Value::Struct(
            StructValue::new()
                .with("entries", Vec::<Value>::new())
                .with("mask", mask),
        )
    };

    let short = codec.encode("entry_dump", &value(vec![Value::U8(7)])).unwrap();
    assert_eq!(short, vec![0, 0, 7, 0, 0, 0]);

    let long = codec
        .encode("entry_dump", &value(vec![Value::U8(1); 6]))
        .unwrap();
    assert_eq!(long, vec![0, 0, 1, 1, 1, 1]);
}

#[test]
fn test_missing_field_fails_before_writing() {
    let codec = codec(&[MEMIF]);
    let value = Value::Struct(StructValue::new().with("role", Value::enum_value("memif_role", 0)));
    let mut buf = [0xaau8; 32];
    assert_matches!(
        codec.encode_into("memif_create", &value, &mut buf),
        Err(CodecError::MissingField { ref path }) if path == "memif_create.rx_queues"
    );
    assert!(buf.iter().all(|&b| b == 0xaa));
}

#[test]
fn test_encode_into_checks_the_buffer_length() {
    let codec = codec(&[MEMIF]);
    let value = memif_create(1, 2, "abc");

    let mut small = [0u8; 28];
    assert_eq!(
        codec.encode_into("memif_create", &value, &mut small),
        Err(CodecError::BufferTooSmall { required: 29, available: 28 })
    );

    let mut large = [0xffu8; 40];
    assert_eq!(codec.encode_into("memif_create", &value, &mut large).unwrap(), 29);
    assert_eq!(large[29], 0xff);
}

#[test]
fn test_short_input_is_a_decode_error() {
    let codec = codec(&[MEMIF, TABLES]);
    let bytes = codec.encode("memif_create", &memif_create(1, 2, "abc")).unwrap();
    assert_eq!(
        codec.decode("memif_create", &bytes[..20]),
        Err(CodecError::ShortBuffer { offset: 5, needed: 24, available: 15 })
    );

    /* n_ids says 2 but only one element follows */
    assert_matches!(
        codec.decode("table_add", &[2, 0, 0, 0, 1]),
        Err(CodecError::ShortBuffer { offset: 5, .. })
    );

    /* length prefix larger than what is left */
    assert_matches!(
        codec.decode("table_add", &[0, 0, 0, 1, 0]),
        Err(CodecError::ShortBuffer { offset: 5, needed: 256, available: 0 })
    );
}

#[test]
fn test_trailing_bytes_are_reported_not_decoded() {
    let codec = codec(&[MEMIF]);
    let mut bytes = codec.encode("memif_create", &memif_create(0, 0, "")).unwrap();
    bytes.extend_from_slice(&[9, 9]);
    let (_, used) = codec.decode_with_len("memif_create", &bytes).unwrap();
    assert_eq!(used, 29);
}

#[test]
fn test_wrong_value_shapes_are_rejected() {
    let codec = codec(&[MEMIF]);
    let value = Value::Struct(
        StructValue::new()
            .with("role", Value::enum_value("other_enum", 0))
            .with("rx_queues", 1u8)
            .with("secret", ""),
    );
    assert_matches!(
        codec.size("memif_create", &value),
        Err(CodecError::TypeMismatch { ref path, .. }) if path == "memif_create.role"
    );
    assert_matches!(
        codec.size("memif_create", &Value::U8(1)),
        Err(CodecError::TypeMismatch { .. })
    );
    assert_matches!(
        codec.size("nothing", &Value::U8(1)),
        Err(CodecError::UnknownTarget { .. })
    );
}

#[test]
fn test_union_size_is_the_largest_member() {
    let codec = codec(&[UNIONS]);
    let blob = codec.union_codec("blob").unwrap();
    assert_eq!(blob.size(), 24);
    assert_eq!(blob.members().collect::<Vec<_>>(), vec!["ip4", "mac", "name"]);
    assert_eq!(codec.target("blob").unwrap().static_size(), Some(24));
}

#[test]
fn test_union_views_share_one_region() {
    let codec = codec(&[UNIONS]);
    let blob = codec.union_codec("blob").unwrap();
    let ip4 = Value::Array(vec![Value::U8(10), Value::U8(0), Value::U8(0), Value::U8(1)]);

    let mut union = blob.new_with("ip4", &ip4).unwrap();
    assert_eq!(union.data.len(), 24);
    assert_eq!(&union.data[..4], &[10, 0, 0, 1]);
    assert_eq!(blob.get(&union, "ip4").unwrap(), ip4);

    /* a shorter write keeps the bytes after it */
    blob.set(&mut union, "name", &Value::from("abcdef"));
    blob.set(&mut union, "ip4", &ip4);
    assert_eq!(&union.data[..6], &[10, 0, 0, 1, b'e', b'f']);
}

#[test]
fn test_union_setter_drops_errors() {
    let codec = codec(&[UNIONS]);
    let word = codec.union_codec("word").unwrap();
    let mut union = word.new_with("value", &Value::U32(0x01020304)).unwrap();

    word.set(&mut union, "value", &Value::from("not a number"));
    word.set(&mut union, "missing", &Value::U32(1));
    assert_eq!(union.data, vec![1, 2, 3, 4]);

    assert_matches!(
        word.new_with("missing", &Value::U32(1)),
        Err(CodecError::UnknownMember { .. })
    );
    assert_eq!(word.get(&union, "half").unwrap(), Value::U16(0x0102));
}

#[test]
fn test_union_inside_struct_is_copied_verbatim() {
    let codec = codec(&[UNIONS]);
    let value = Value::Struct(
        StructValue::new()
            .with("kind", 1u8)
            .with("data", UnionValue { data: vec![0xde, 0xad, 0xbe, 0xef] }),
    );
    let bytes = codec.encode("holder", &value).unwrap();
    assert_eq!(bytes, vec![1, 0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(codec.decode("holder", &bytes).unwrap(), value);

    let wrong = Value::Struct(
        StructValue::new()
            .with("kind", 1u8)
            .with("data", UnionValue { data: vec![0; 3] }),
    );
    assert_matches!(
        codec.size("holder", &wrong),
        Err(CodecError::UnionSize { expected: 4, found: 3, .. })
    );
}

#[test]
fn test_types_decode_by_name() {
    let codec = codec(&[UNIONS]);
    let bytes = [2, 0, 0, 0, 5, 0];
    let (value, used) = codec.decode_with_len("mac_address", &bytes).unwrap();
    assert_eq!(used, 6);
    assert_eq!(value.as_array().map(<[Value]>::len), Some(6));
}
