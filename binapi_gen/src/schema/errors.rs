use thiserror::Error;

/* Schema integrity failures found while building the resolved plan */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
  #[error(
    "unknown type '{type_ref}'{suffix}",
    suffix = .referenced_by.as_ref().map(|r| format!(" referenced by {r}")).unwrap_or_default()
  )]
  UnknownType { type_ref: String, referenced_by: Option<String> },

  #[error("type '{name}' is defined by both '{first}' and '{second}'")]
  DuplicateType { name: String, first: String, second: String },

  #[error("enum '{name}' must use an integer base type, not '{base}'")]
  InvalidEnumBase { name: String, base: String },

  #[error("field '{owner}.{field}' has invalid size-from '{size_from}': {reason}")]
  InvalidSizeFrom { owner: String, field: String, size_from: String, reason: String },

  #[error("array field '{owner}.{field}' has neither a fixed length nor a size-from field")]
  UnboundedArray { owner: String, field: String },

  #[error("counted array '{owner}.{field}' has elements with no wire size")]
  ZeroSizedElement { owner: String, field: String },

  #[error("union '{union}' member '{member}' has no fixed wire size")]
  UnsizedUnionMember { union: String, member: String },

  #[error("circular type dependency: {chain}", chain = .0.join(" -> "))]
  CircularDependency(Vec<String>),
}

impl ResolutionError {
  /* Attach the referencing field to an unknown-type error */
  pub fn referenced_by(self, owner: &str, field: &str) -> Self {
    match self {
      ResolutionError::UnknownType { type_ref, .. } => ResolutionError::UnknownType {
        type_ref,
        referenced_by: Some(format!("{owner}.{field}")),
      },
      other => other,
    }
  }
}
