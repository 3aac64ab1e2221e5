//! `# Key: value` metadata comments at the top of threat files

use indexmap::IndexMap;
use serde::Serialize;

/// Fields every published threat file should carry
pub const RECOMMENDED_FIELDS: [&str; 3] = ["Description", "Source", "Last updated"];

/// Metadata declared in a threat file's comment lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreatMetadata {
    /// Fields in declaration order, keyed as written
    pub fields: IndexMap<String, String>,
    /// Comment lines that carry no `Key: value` field
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
}

impl ThreatMetadata {
    /// Collect metadata from the comment block that precedes the first data line
    ///
    /// Blank lines inside the block are allowed. A later duplicate key
    /// overrides the earlier value.
    pub fn parse(text: &str) -> Self {
        let mut metadata = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(comment) = line.strip_prefix('#') else {
                break;
            };
            let comment = comment.trim();
            if comment.is_empty() {
                continue;
            }

            match comment.split_once(':') {
                Some((key, value)) if is_field_key(key) && !value.starts_with("//") => {
                    metadata
                        .fields
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                _ => metadata.comment_lines.push(comment.to_string()),
            }
        }

        metadata
    }

    /// Case-insensitive field lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Recommended fields that are absent, lowercased
    pub fn missing_recommended(&self) -> Vec<String> {
        RECOMMENDED_FIELDS
            .iter()
            .filter(|field| !self.has_field(field))
            .map(|field| field.to_lowercase())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_recommended().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_field_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
}
