use serde::Deserialize;

use crate::error::PipelineError;
use crate::models::{MappedData, MappedValue, SiteRecord};
use crate::utils::strip_whitespace;

/// Value transformation applied while mapping a source field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    None,
    Trim,
    StripSpaces,
    /// Split on newlines into a list; each entry trimmed, blanks dropped
    Lines,
    Lowercase,
    Uppercase,
}

impl Transform {
    pub fn apply(self, raw: &str) -> MappedValue {
        match self {
            Self::None => MappedValue::Scalar(raw.to_string()),
            Self::Trim => MappedValue::Scalar(raw.trim().to_string()),
            Self::StripSpaces => MappedValue::Scalar(strip_whitespace(raw)),
            Self::Lines => MappedValue::from(
                raw.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>(),
            ),
            Self::Lowercase => MappedValue::Scalar(raw.to_lowercase()),
            Self::Uppercase => MappedValue::Scalar(raw.to_uppercase()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Trim => "trim",
            Self::StripSpaces => "strip_spaces",
            Self::Lines => "lines",
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
        }
    }
}

/// One row of the mapping table: which source field feeds which placeholder
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    pub source: String,
    pub placeholder: String,
    #[serde(default)]
    pub transform: Transform,
    /// Used when the source field is absent from the record
    #[serde(default)]
    pub default: Option<String>,
}

/// Declarative source-field -> placeholder table, loaded from configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MappingSpec {
    /// Also expose every raw field under its own name
    #[serde(default = "default_passthrough")]
    pub passthrough: bool,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

fn default_passthrough() -> bool {
    true
}

impl Default for MappingSpec {
    fn default() -> Self {
        Self {
            passthrough: default_passthrough(),
            fields: Vec::new(),
        }
    }
}

impl MappingSpec {
    /// Translate a raw record into template data.
    ///
    /// Explicit mappings take priority over passthrough names; when two
    /// mappings target the same placeholder the later one wins.
    pub fn map(&self, record: &SiteRecord) -> Result<MappedData, PipelineError> {
        let mut data = MappedData::new();

        for mapping in &self.fields {
            let raw = match (record.get(&mapping.source), &mapping.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.as_str(),
                (None, None) => {
                    return Err(PipelineError::Mapping {
                        field: mapping.source.clone(),
                    })
                }
            };

            let value = mapping.transform.apply(raw);
            if data.insert(mapping.placeholder.clone(), value).is_some() {
                tracing::warn!(
                    "Placeholder {} is mapped more than once; using source field {}",
                    mapping.placeholder,
                    mapping.source
                );
            }
        }

        if self.passthrough {
            for (field, value) in record.fields() {
                data.entry(field.to_string())
                    .or_insert_with(|| MappedValue::from(value));
            }
        }

        tracing::debug!("Mapped {} fields into {} placeholders", record.len(), data.len());
        Ok(data)
    }
}
