//! Serialization of catalog entities.
//!
//! This module provides writers for streaming entities out in the formats
//! the CLI supports: multi-document YAML, NDJSON and a JSON array.

use serde::Serialize;
use std::io::Write;
use thiserror::Error;

/// Error type for serialization operations
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Output format for entity streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `---`-separated YAML documents
    #[default]
    Yaml,
    /// One JSON array
    Json,
    /// One JSON object per line
    Ndjson,
}

/// Write every item in `items` to `writer` in the given format.
pub fn write_all<W: Write, T: Serialize>(
    writer: W,
    format: OutputFormat,
    items: &[T],
) -> Result<(), SerializationError> {
    match format {
        OutputFormat::Yaml => {
            let mut out = YamlStreamWriter::new(writer);
            for item in items {
                out.write(item)?;
            }
            out.flush()
        }
        OutputFormat::Json => {
            let mut out = JsonArrayWriter::new(writer)?;
            for item in items {
                out.write(item)?;
            }
            out.finish()
        }
        OutputFormat::Ndjson => {
            let mut out = NdjsonWriter::new(writer);
            for item in items {
                out.write(item)?;
            }
            out.flush()
        }
    }
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes entities as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    /// Create a new NDJSON writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single entity as an NDJSON line
    pub fn write<T: Serialize>(&mut self, entity: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(entity)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// Writes entities as a JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    /// Write a single entity to the JSON array
    pub fn write<T: Serialize>(&mut self, entity: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(entity)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        writeln!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Multi-document YAML writer
///
/// Writes each entity as its own document, each preceded by `---`, the
/// layout catalog location files use.
pub struct YamlStreamWriter<W: Write> {
    writer: W,
}

impl<W: Write> YamlStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single entity as a YAML document
    pub fn write<T: Serialize>(&mut self, entity: &T) -> Result<(), SerializationError> {
        let yaml = serde_yaml::to_string(entity)?;
        writeln!(self.writer, "---")?;
        write!(self.writer, "{}", yaml)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use serde_json::json;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("eda.io/v1alpha1", "Event", "orders-orderplaced")
                .with_spec(json!({ "topic": "orders" })),
            Entity::new("eda.io/v1alpha1", "Event", "orders-ordershipped")
                .with_spec(json!({ "topic": "shipments" })),
        ]
    }

    #[test]
    fn test_ndjson_writer() {
        let mut buf = Vec::new();
        let mut writer = NdjsonWriter::new(&mut buf);

        for entity in entities() {
            writer.write(&entity).unwrap();
        }
        writer.flush().unwrap();

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("orders-orderplaced"));
        assert!(lines[1].contains("shipments"));
    }

    #[test]
    fn test_json_array_writer() {
        let mut buf = Vec::new();
        write_all(&mut buf, OutputFormat::Json, &entities()).unwrap();

        let parsed: Vec<Entity> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, entities());
    }

    #[test]
    fn test_yaml_stream_writer() {
        let mut buf = Vec::new();
        write_all(&mut buf, OutputFormat::Yaml, &entities()).unwrap();

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("---\n"));
        assert_eq!(output.matches("---\n").count(), 2);
        assert!(output.contains("apiVersion: eda.io/v1alpha1"));
        assert!(output.contains("name: orders-ordershipped"));
    }

    #[test]
    fn test_empty_json_array() {
        let mut buf = Vec::new();
        write_all::<_, Entity>(&mut buf, OutputFormat::Json, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "[]");
    }
}
