use crate::base::BaseType;
use serde_derive::{Deserialize, Serialize};

/* Free-form per-field metadata carried through from the schema source */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FieldMeta {
    /* Numeric default used when a value omits the field */
    #[serde(default)]
    pub default: Option<f64>,
    /* Upper bound on encoded element count (informational) */
    #[serde(default)]
    pub limit: Option<u32>,
}

impl FieldMeta {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.limit.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Field {
    pub name: String,
    /* Name of a base type, enum, alias, struct or union */
    #[serde(rename = "type")]
    pub type_ref: String,
    #[serde(default)]
    pub array: bool,
    /* Fixed element count (or fixed string length), 0 when not fixed */
    #[serde(default)]
    pub length: usize,
    /* Sibling field holding the runtime element count */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_from: Option<String>,
    #[serde(default, skip_serializing_if = "FieldMeta::is_empty")]
    pub meta: FieldMeta,
}

impl Field {
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            array: false,
            length: 0,
            size_from: None,
            meta: FieldMeta::default(),
        }
    }

    /* Fixed-length array (or fixed-length string) */
    pub fn fixed(name: impl Into<String>, type_ref: impl Into<String>, length: usize) -> Self {
        Self {
            array: true,
            length,
            ..Self::new(name, type_ref)
        }
    }

    /* Variable-length array sized by a sibling field */
    pub fn counted(
        name: impl Into<String>,
        type_ref: impl Into<String>,
        size_from: impl Into<String>,
    ) -> Self {
        Self {
            array: true,
            size_from: Some(size_from.into()),
            ..Self::new(name, type_ref)
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.meta.default = Some(default);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumEntry {
    pub name: String,
    pub value: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumDef {
    pub name: String,
    /* Underlying integer type used on the wire */
    #[serde(rename = "type")]
    pub base: BaseType,
    #[serde(default)]
    pub entries: Vec<EnumEntry>,
}

impl EnumDef {
    pub fn entry_name(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.name.as_str())
    }

    pub fn entry_value(&self, name: &str) -> Option<i64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct AliasDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: String,
    /* Non-zero makes the alias a fixed array (or fixed string) */
    #[serde(default)]
    pub length: usize,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct UnionDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MessageDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    /* Content checksum used for compatibility checks, e.g. "0xb1b25061" */
    #[serde(default)]
    pub crc: String,
}

/* One schema module: the unit of loading and of code generation */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub crc: String,
    /* Names of modules whose types this module references */
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub aliases: Vec<AliasDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub unions: Vec<UnionDef>,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

impl Module {
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(source)
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yml::Error> {
        serde_yml::to_string(self)
    }

    /* Names of every type defined by this module, in declaration order */
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(self.aliases.iter().map(|a| a.name.as_str()))
            .chain(self.structs.iter().map(|s| s.name.as_str()))
            .chain(self.unions.iter().map(|u| u.name.as_str()))
    }

    pub fn definition_count(&self) -> usize {
        self.enums.len()
            + self.aliases.len()
            + self.structs.len()
            + self.unions.len()
            + self.messages.len()
    }
}
