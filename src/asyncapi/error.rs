use thiserror::Error;

/// Error type for deriving Event entities from an AsyncAPI definition
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Failed to parse asyncapi definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("asyncapi definition is not a mapping (found {found})")]
    NotADocument { found: &'static str },

    #[error("Malformed asyncapi definition at '{path}': expected {expected}")]
    Malformed { path: String, expected: &'static str },

    #[error("Unresolved message reference '{reference}' in channel '{channel}' (message '{message}')")]
    UnresolvedRef {
        channel: String,
        message: String,
        reference: String,
    },

    #[error("Message '{message}' cannot be represented as JSON: {source}")]
    Conversion {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize scoped definition: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Short name of a YAML value's type, for error messages.
pub(crate) fn value_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
