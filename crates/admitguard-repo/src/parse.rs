use anyhow::Context;
use camino::Utf8Path;
use serde::Deserialize;
use serde_json::Value;

/// Document syntax, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.json` is JSON; everything else is read as YAML (a JSON superset).
    pub fn for_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse every document in `text`.
///
/// YAML streams may hold several `---`-separated documents; empty documents
/// are skipped. JSON text holds exactly one document.
pub fn parse_documents(text: &str, format: DocumentFormat) -> anyhow::Result<Vec<Value>> {
    match format {
        DocumentFormat::Json => {
            let value: Value = serde_json::from_str(text).context("parse JSON document")?;
            Ok(vec![value])
        }
        DocumentFormat::Yaml => {
            let mut out = Vec::new();
            for (idx, doc) in serde_yaml::Deserializer::from_str(text).enumerate() {
                let value = Value::deserialize(doc)
                    .with_context(|| format!("parse YAML document {idx}"))?;
                if !value.is_null() {
                    out.push(value);
                }
            }
            Ok(out)
        }
    }
}

/// Parse `text` that must hold exactly one mapping.
pub fn parse_single_mapping(text: &str, format: DocumentFormat) -> anyhow::Result<Value> {
    let mut docs = parse_documents(text, format)?;
    if docs.len() != 1 {
        anyhow::bail!("expected exactly one document, found {}", docs.len());
    }
    let doc = docs.remove(0);
    if !doc.is_object() {
        anyhow::bail!("expected a mapping at the document root");
    }
    Ok(doc)
}
