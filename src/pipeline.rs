//! End-to-end export flows
//!
//! local records → identifiers → batch lookup → reconciliation → export rows

use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::export::{build_card_exports, build_price_exports};
use crate::identifier::{derive_identifier, LookupIdentifier};
use crate::models::{CardExport, LocalCardRecord, PriceExport};
use crate::price::UsdPrice;
use crate::reconcile::{reconcile, Reconciliation};
use crate::scryfall::{BatchLookupClient, CatalogTransport};

/// Export rows plus everything worth telling the user about them
#[derive(Debug)]
pub struct ExportOutcome<R> {
    pub rows: Vec<R>,
    pub unresolved: Vec<LocalCardRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Look up every record and join the answers back.
///
/// All records are validated first so a bad entry fails before any request.
pub fn lookup_and_reconcile<T: CatalogTransport>(
    client: &BatchLookupClient<T>,
    records: &[LocalCardRecord],
) -> Result<Reconciliation> {
    for (index, record) in records.iter().enumerate() {
        record.validate("input", index + 1)?;
    }

    let identifiers: Vec<LookupIdentifier> = records.iter().map(derive_identifier).collect();
    let catalog_records = client.fetch_catalog_records(&identifiers)?;
    Ok(reconcile(records, catalog_records))
}

pub fn export_cards<T: CatalogTransport>(
    client: &BatchLookupClient<T>,
    records: &[LocalCardRecord],
) -> Result<ExportOutcome<CardExport>> {
    let reconciliation = lookup_and_reconcile(client, records)?;

    Ok(ExportOutcome {
        rows: build_card_exports(&reconciliation.resolved),
        unresolved: reconciliation.unresolved,
        diagnostics: reconciliation.diagnostics,
    })
}

pub fn export_prices<T: CatalogTransport>(
    client: &BatchLookupClient<T>,
    records: &[LocalCardRecord],
    threshold: UsdPrice,
) -> Result<ExportOutcome<PriceExport>> {
    let reconciliation = lookup_and_reconcile(client, records)?;
    let (rows, excluded) = build_price_exports(&reconciliation.resolved, threshold);

    let mut diagnostics = reconciliation.diagnostics;
    diagnostics.extend(excluded);

    Ok(ExportOutcome {
        rows,
        unresolved: reconciliation.unresolved,
        diagnostics,
    })
}
