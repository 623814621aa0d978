//! Parsed AsyncAPI document.

use std::sync::OnceLock;

use serde_yaml::{Mapping, Value};

use super::error::{value_kind, DeriveError};
use super::walker::ChannelMessages;

/// An AsyncAPI document decoded from YAML.
///
/// Only `channels` and `components.messages` are interpreted; every other
/// field is carried as an opaque value. Key order is the order of the
/// source document.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncDocument {
    root: Mapping,
}

impl AsyncDocument {
    /// Decode a YAML string.
    ///
    /// # Errors
    /// * [`DeriveError::Yaml`] - the string is not valid YAML
    /// * [`DeriveError::NotADocument`] - the root is not a mapping
    /// * [`DeriveError::Malformed`] - `channels`, `components` or
    ///   `components.messages` is present but not a mapping
    ///
    /// # Example
    /// ```
    /// use eda_catalog::asyncapi::AsyncDocument;
    ///
    /// let doc = AsyncDocument::parse("asyncapi: '3.0.0'\n").unwrap();
    /// assert!(doc.channels().is_empty());
    /// ```
    pub fn parse(source: &str) -> Result<Self, DeriveError> {
        let value: Value = serde_yaml::from_str(source)?;
        Self::from_value(value)
    }

    /// Build a document from an already decoded YAML value.
    pub fn from_value(value: Value) -> Result<Self, DeriveError> {
        let root = match value {
            Value::Mapping(root) => root,
            other => {
                return Err(DeriveError::NotADocument {
                    found: value_kind(&other),
                })
            }
        };

        expect_mapping(root.get("channels"), "channels")?;
        let components = expect_mapping(root.get("components"), "components")?;
        if let Some(components) = components {
            expect_mapping(components.get("messages"), "components.messages")?;
            expect_mapping(components.get("schemas"), "components.schemas")?;
        }

        Ok(Self { root })
    }

    /// The full top-level mapping.
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// `channels`, or an empty mapping when absent.
    pub fn channels(&self) -> &Mapping {
        self.mapping_at(&["channels"])
    }

    /// `components`, or an empty mapping when absent.
    pub fn components(&self) -> &Mapping {
        self.mapping_at(&["components"])
    }

    /// `components.messages`, or an empty mapping when absent.
    pub fn component_messages(&self) -> &Mapping {
        self.mapping_at(&["components", "messages"])
    }

    /// `components.schemas`, or an empty mapping when absent.
    pub fn component_schemas(&self) -> &Mapping {
        self.mapping_at(&["components", "schemas"])
    }

    /// Iterate every (channel, message) pair in document order.
    pub fn channel_messages(&self) -> ChannelMessages<'_> {
        ChannelMessages::new(self.channels())
    }

    fn mapping_at(&self, path: &[&str]) -> &Mapping {
        let mut current = &self.root;
        for key in path {
            match current.get(*key) {
                Some(Value::Mapping(next)) => current = next,
                _ => return empty_mapping(),
            }
        }
        current
    }
}

fn expect_mapping<'a>(value: Option<&'a Value>, path: &str) -> Result<Option<&'a Mapping>, DeriveError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Some(_) => Err(DeriveError::Malformed {
            path: path.to_string(),
            expected: "a mapping",
        }),
    }
}

pub(crate) fn empty_mapping() -> &'static Mapping {
    static EMPTY: OnceLock<Mapping> = OnceLock::new();
    EMPTY.get_or_init(Mapping::new)
}
