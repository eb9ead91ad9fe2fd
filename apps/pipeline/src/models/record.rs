use serde::Deserialize;
use serde_json::{Map, Value};

/// Column values of a record, keyed by column name.
pub type Fields = Map<String, Value>;

/// A row as returned by the record store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

/// One page of a table listing. `offset` is the cursor for the next page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Linked record ids held in `field`, in stored order.
    pub fn links(&self, field: &str) -> Vec<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn first_link(&self, field: &str) -> Option<&str> {
        self.links(field).into_iter().next()
    }

    /// True when the first link in `field` points at `id`.
    pub fn links_back_to(&self, field: &str, id: &str) -> bool {
        self.first_link(field) == Some(id)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    /// Text value of `field`, treating whitespace-only strings as absent.
    pub fn non_empty_text(&self, field: &str) -> Option<&str> {
        self.text(field).filter(|s| !s.trim().is_empty())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(|v| v.as_f64())
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }
}
