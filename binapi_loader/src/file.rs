use anyhow::Context;
use binapi_types::Module;
use std::path::Path;

/* On-disk encodings accepted for schema modules */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
}

impl SchemaFormat {
    /* Extensions tried, in order, when resolving a module name to a file */
    pub const EXTENSIONS: [&'static str; 3] = ["yaml", "yml", "json"];

    /* Pick the format from a file extension; anything unknown is read as YAML */
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SchemaFormat::Json,
            _ => SchemaFormat::Yaml,
        }
    }
}

/* Parse a module from its textual form */
pub fn parse_module(contents: &str, format: SchemaFormat) -> anyhow::Result<Module> {
    let module = match format {
        SchemaFormat::Yaml => serde_yml::from_str(contents)?,
        SchemaFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(module)
}

/* Read and parse a single module file without following its imports */
pub fn load_module(path: &Path) -> anyhow::Result<Module> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file {}", path.display()))?;
    parse_module(&contents, SchemaFormat::from_path(path))
        .with_context(|| format!("failed to parse schema file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SchemaFormat::from_path(Path::new("a/memif.json")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("a/memif.JSON")), SchemaFormat::Json);
        assert_eq!(SchemaFormat::from_path(Path::new("memif.yaml")), SchemaFormat::Yaml);
        assert_eq!(SchemaFormat::from_path(Path::new("memif")), SchemaFormat::Yaml);
    }

    #[test]
    fn json_and_yaml_parse_to_the_same_module() {
        let yaml = "name: m\naliases:\n  - { name: ip4_address, type: u8, length: 4 }\n";
        let json = r#"{"name":"m","aliases":[{"name":"ip4_address","type":"u8","length":4}]}"#;
        let from_yaml = parse_module(yaml, SchemaFormat::Yaml).unwrap();
        let from_json = parse_module(json, SchemaFormat::Json).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_json.aliases[0].length, 4);
    }
}
