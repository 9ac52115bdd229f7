//! MTG Export - resolves card lists against Scryfall
//!
//! Reads a local card list, looks every card up on Scryfall in batches and
//! writes a CSV with multiverse ids and quantities (optionally prices).

pub mod diagnostics;
pub mod error;
pub mod export;
pub mod identifier;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod price;
pub mod reconcile;
pub mod scryfall;

pub use diagnostics::Diagnostic;
pub use error::{ExportError, Result};
pub use identifier::{derive_identifier, LookupIdentifier};
pub use io::{read_local_records, InputFormat};
pub use models::{CardExport, CatalogCardRecord, LocalCardRecord, PriceExport};
pub use pipeline::{export_cards, export_prices, ExportOutcome};
pub use price::UsdPrice;
pub use reconcile::{reconcile, Reconciliation, ResolvedCard};
pub use scryfall::{BatchLookupClient, CatalogTransport, LookupConfig, ScryfallTransport};
