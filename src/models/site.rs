use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field that identifies a site row in the inventory
pub const SITE_ID_FIELD: &str = "Site_ID";

/// SiteRecord is one inventory row: field name -> raw cell value.
///
/// Serializes as a flat JSON object, which is also the on-disk format of
/// `<site_id>_site_info.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteRecord {
    fields: BTreeMap<String, String>,
}

impl SiteRecord {
    /// Raw value of a field, if the source provided one
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Raw value of a field, or "" when absent
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn site_id(&self) -> Option<&str> {
        self.get(SITE_ID_FIELD)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SiteRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
