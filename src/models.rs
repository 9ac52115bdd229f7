use crate::error::{ExportError, Result};
use crate::price::UsdPrice;
use serde::{Deserialize, Serialize};

/// One card entry from the user's own list, before catalog enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCardRecord {
    pub name: String,
    /// Upper-cased set code, e.g. "LEA"
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    /// Multiverse id, when the input already knows it
    pub catalog_id: Option<u64>,
    pub quantity: u32,
}

impl LocalCardRecord {
    /// Record identified by name and set only
    pub fn named(name: &str, set_code: &str, quantity: u32) -> Self {
        Self {
            name: name.to_string(),
            set_code: Some(set_code.to_uppercase()),
            collector_number: None,
            catalog_id: None,
            quantity,
        }
    }

    pub fn with_collector_number(mut self, collector_number: &str) -> Self {
        self.collector_number = Some(collector_number.to_string());
        self
    }

    pub fn with_catalog_id(mut self, catalog_id: u64) -> Self {
        self.catalog_id = Some(catalog_id);
        self
    }

    /// Checks the record can be looked up at all.
    ///
    /// Needs one of: catalog id, name + set, or set + collector number.
    /// Quantity 0 is only accepted alongside a catalog id, which is how
    /// earlier exports list cards that were not in the local list.
    /// `line` is only used for the error message.
    pub fn validate(&self, source_name: &str, line: usize) -> Result<()> {
        let invalid = |reason: &str| ExportError::InvalidRecord {
            source_name: source_name.to_string(),
            line,
            reason: format!("{} ({})", reason, self.name),
        };

        if self.catalog_id.is_some() {
            return Ok(());
        }
        if self.quantity == 0 {
            return Err(invalid("quantity must be greater than zero"));
        }
        if self.set_code.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("card has neither a multiverse id nor a set code"));
        }
        if self.collector_number.is_none() && self.name.trim().is_empty() {
            return Err(invalid("card has neither a name nor a collector number"));
        }
        Ok(())
    }
}

/// One card as returned by the catalog service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogCardRecord {
    pub name: String,
    /// Multiverse ids as decimal strings; may be empty
    pub catalog_ids: Vec<String>,
    /// Set code as the service spells it (usually lower case)
    pub set_code: String,
    pub collector_number: String,
    pub price_usd: Option<UsdPrice>,
}

/// Quantity-only export row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExport {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MultiverseID")]
    pub catalog_id: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
}

/// Export row with the USD price attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceExport {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MultiverseID")]
    pub catalog_id: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Price")]
    pub price_usd: UsdPrice,
}

/// Multiverse ids show up both as JSON numbers and as strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    pub(crate) fn into_string(self) -> String {
        match self {
            IdValue::Number(n) => n.to_string(),
            IdValue::Text(s) => s.trim().to_string(),
        }
    }
}
