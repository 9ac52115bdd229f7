//! Scryfall collection lookups
//!
//! Identifiers are sent to `/cards/collection` in chunks of at most 75.
//! Chunks go out one after another on the calling thread.

use crate::error::{ExportError, Result};
use crate::identifier::LookupIdentifier;
use crate::models::{CatalogCardRecord, IdValue};
use crate::price::UsdPrice;
use serde::{Deserialize, Serialize};

/// Scryfall's per-request identifier cap
pub const MAX_IDENTIFIERS_PER_REQUEST: usize = 75;

pub const COLLECTION_URL: &str = "https://api.scryfall.com/cards/collection";

const USER_AGENT: &str = "D2D-Automations-MtgExport/1.0";

/// Where and how collection lookups are sent
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub api_url: String,
    pub chunk_size: usize,
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_url: COLLECTION_URL.to_string(),
            chunk_size: MAX_IDENTIFIERS_PER_REQUEST,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ExportError::Config(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(ExportError::Config("API URL must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Submits one batch of identifiers and returns whatever cards came back
pub trait CatalogTransport {
    fn submit(&self, identifiers: &[LookupIdentifier]) -> Result<Vec<CatalogCardRecord>>;
}

/// Scryfall card as returned by the collection endpoint
#[derive(Debug, Deserialize)]
pub struct ScryfallCard {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    multiverse_ids: Vec<IdValue>,
    #[serde(default)]
    pub set: String,
    #[serde(default)]
    pub collector_number: String,
    #[serde(default)]
    pub prices: ScryfallPrices,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScryfallPrices {
    #[serde(default)]
    pub usd: Option<UsdPrice>,
}

impl From<ScryfallCard> for CatalogCardRecord {
    fn from(card: ScryfallCard) -> Self {
        CatalogCardRecord {
            name: card.name,
            catalog_ids: card
                .multiverse_ids
                .into_iter()
                .map(IdValue::into_string)
                .collect(),
            set_code: card.set,
            collector_number: card.collector_number,
            price_usd: card.prices.usd,
        }
    }
}

#[derive(Debug, Serialize)]
struct CollectionRequest<'a> {
    identifiers: &'a [LookupIdentifier],
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    data: Vec<ScryfallCard>,
    #[serde(default)]
    not_found: Vec<serde_json::Value>,
}

/// Scryfall API error response
#[derive(Debug, Deserialize)]
struct ScryfallError {
    code: String,
    details: String,
}

/// Blocking HTTP transport against the Scryfall collection endpoint
pub struct ScryfallTransport {
    client: reqwest::blocking::Client,
    url: String,
}

impl ScryfallTransport {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
        })
    }
}

impl CatalogTransport for ScryfallTransport {
    fn submit(&self, identifiers: &[LookupIdentifier]) -> Result<Vec<CatalogCardRecord>> {
        log::debug!(
            "POST {} with {} identifiers",
            self.url,
            identifiers.len()
        );

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&CollectionRequest { identifiers })
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ScryfallError>(&body) {
                Ok(error) => ExportError::ApiResponse {
                    status: status.as_u16(),
                    code: error.code,
                    details: error.details,
                },
                Err(_) => ExportError::ApiResponse {
                    status: status.as_u16(),
                    code: status
                        .canonical_reason()
                        .unwrap_or("unknown")
                        .to_string(),
                    details: body.chars().take(200).collect(),
                },
            });
        }

        let result: CollectionResponse =
            serde_json::from_str(&body).map_err(ExportError::MalformedResponse)?;

        // Each miss is reported again per local entry after reconciliation
        if !result.not_found.is_empty() {
            log::debug!(
                "Scryfall could not find {} of {} identifiers in this batch",
                result.not_found.len(),
                identifiers.len()
            );
        }

        Ok(result.data.into_iter().map(CatalogCardRecord::from).collect())
    }
}

/// Splits identifier lists into service-sized chunks and concatenates the answers
pub struct BatchLookupClient<T> {
    transport: T,
    chunk_size: usize,
}

impl BatchLookupClient<ScryfallTransport> {
    /// Client talking to Scryfall over HTTP
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        config.validate()?;
        Self::new(ScryfallTransport::new(config)?, config.chunk_size)
    }
}

impl<T: CatalogTransport> BatchLookupClient<T> {
    pub fn new(transport: T, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ExportError::Config(
                "chunk size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            transport,
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up all identifiers, one request per chunk, in chunk order.
    ///
    /// The result is not index-aligned with the input: Scryfall may drop or
    /// reorder cards. The first failing request aborts the whole lookup.
    pub fn fetch_catalog_records(
        &self,
        identifiers: &[LookupIdentifier],
    ) -> Result<Vec<CatalogCardRecord>> {
        let total_chunks = identifiers.len().div_ceil(self.chunk_size);
        log::info!(
            "Looking up {} cards on Scryfall in {} request(s)",
            identifiers.len(),
            total_chunks
        );

        let mut cards = Vec::with_capacity(identifiers.len());
        for (index, chunk) in identifiers.chunks(self.chunk_size).enumerate() {
            log::debug!(
                "Requesting chunk {}/{} ({} identifiers)",
                index + 1,
                total_chunks,
                chunk.len()
            );
            let batch = self.transport.submit(chunk)?;
            log::debug!("Chunk {} returned {} cards", index + 1, batch.len());
            cards.extend(batch);
        }

        log::info!("Scryfall returned {} cards", cards.len());
        Ok(cards)
    }
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
