//! Export rows and the CSV sink
//!
//! Two shapes: `Name,MultiverseID,Quantity` for collection imports and the
//! same plus `Price` for the price-filtered variant.

use crate::diagnostics::Diagnostic;
use crate::error::{ExportError, Result};
use crate::models::{CardExport, LocalCardRecord, PriceExport};
use crate::price::UsdPrice;
use crate::reconcile::ResolvedCard;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub const CARD_HEADER: [&str; 3] = ["Name", "MultiverseID", "Quantity"];
pub const PRICE_HEADER: [&str; 4] = ["Name", "MultiverseID", "Quantity", "Price"];

/// One row per resolved card, in the order Scryfall returned them.
pub fn build_card_exports(resolved: &[ResolvedCard]) -> Vec<CardExport> {
    resolved
        .iter()
        .map(|card| CardExport {
            name: card.catalog.name.clone(),
            catalog_id: card.catalog_id.clone(),
            quantity: card.quantity,
        })
        .collect()
}

/// Like [`build_card_exports`] with prices, skipping cards above `threshold`.
///
/// A card without a USD price counts as 0.00 and is kept.
pub fn build_price_exports(
    resolved: &[ResolvedCard],
    threshold: UsdPrice,
) -> (Vec<PriceExport>, Vec<Diagnostic>) {
    let mut exports = Vec::with_capacity(resolved.len());
    let mut diagnostics = Vec::new();

    for card in resolved {
        let price = card.catalog.price_usd.unwrap_or(UsdPrice::ZERO);
        if price > threshold {
            diagnostics.push(Diagnostic::AboveThreshold {
                name: card.catalog.name.clone(),
                price,
                threshold,
            });
            continue;
        }

        exports.push(PriceExport {
            name: card.catalog.name.clone(),
            catalog_id: card.catalog_id.clone(),
            quantity: card.quantity,
            price_usd: price,
        });
    }

    (exports, diagnostics)
}

/// Card rows straight from local records that already know their multiverse id.
pub fn build_offline_card_exports(records: &[LocalCardRecord]) -> Result<Vec<CardExport>> {
    records
        .iter()
        .map(|record| {
            let catalog_id = record
                .catalog_id
                .ok_or_else(|| ExportError::MissingCatalogId {
                    name: record.name.clone(),
                })?;
            Ok(CardExport {
                name: record.name.clone(),
                catalog_id: catalog_id.to_string(),
                quantity: record.quantity,
            })
        })
        .collect()
}

/// Write rows as CSV. The header is always written, even with no rows.
pub fn write_csv<W: Write, R: Serialize>(writer: W, header: &[&str], rows: &[R]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render the whole CSV before touching `path`, so a failed run never
/// leaves a truncated file behind.
fn write_csv_file<R: Serialize>(path: &Path, header: &[&str], rows: &[R]) -> Result<()> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, header, rows)?;
    std::fs::write(path, buffer)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_card_exports<P: AsRef<Path>>(path: P, rows: &[CardExport]) -> Result<()> {
    write_csv_file(path.as_ref(), &CARD_HEADER, rows)
}

pub fn write_price_exports<P: AsRef<Path>>(path: P, rows: &[PriceExport]) -> Result<()> {
    write_csv_file(path.as_ref(), &PRICE_HEADER, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogCardRecord;

    fn resolved(name: &str, id: &str, quantity: u32, price: Option<&str>) -> ResolvedCard {
        ResolvedCard {
            local: None,
            catalog: CatalogCardRecord {
                name: name.to_string(),
                catalog_ids: vec![id.to_string()],
                set_code: "lea".to_string(),
                collector_number: "1".to_string(),
                price_usd: price.map(|p| UsdPrice::parse(p).unwrap()),
            },
            catalog_id: id.to_string(),
            quantity,
        }
    }

    fn to_csv<R: Serialize>(header: &[&str], rows: &[R]) -> String {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, header, rows).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn card_exports_keep_resolved_order() {
        let cards = vec![
            resolved("Lightning Bolt", "3255", 4, None),
            resolved("Dark Ritual", "3254", 0, None),
        ];

        let exports = build_card_exports(&cards);

        assert_eq!(
            exports,
            vec![
                CardExport {
                    name: "Lightning Bolt".to_string(),
                    catalog_id: "3255".to_string(),
                    quantity: 4,
                },
                CardExport {
                    name: "Dark Ritual".to_string(),
                    catalog_id: "3254".to_string(),
                    quantity: 0,
                },
            ]
        );
    }

    #[test]
    fn price_above_threshold_is_excluded_and_reported() {
        let threshold = UsdPrice::parse("0.80").unwrap();
        let cards = vec![
            resolved("Lightning Bolt", "3255", 4, Some("1.25")),
            resolved("Llanowar Elves", "5", 2, Some("0.80")),
        ];

        let (exports, diagnostics) = build_price_exports(&cards, threshold);

        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].name, "Llanowar Elves");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::AboveThreshold {
                name: "Lightning Bolt".to_string(),
                price: UsdPrice::parse("1.25").unwrap(),
                threshold,
            }]
        );
    }

    #[test]
    fn missing_price_counts_as_free() {
        let (exports, diagnostics) =
            build_price_exports(&[resolved("Island", "1", 3, None)], UsdPrice::ZERO);

        assert!(diagnostics.is_empty());
        assert_eq!(exports[0].price_usd, UsdPrice::ZERO);
    }

    #[test]
    fn offline_export_requires_catalog_ids() {
        let with_id = LocalCardRecord {
            name: "Sol Ring".to_string(),
            set_code: None,
            collector_number: None,
            catalog_id: Some(382866),
            quantity: 1,
        };
        let rows = build_offline_card_exports(&[with_id.clone()]).unwrap();
        assert_eq!(rows[0].catalog_id, "382866");

        let without_id = LocalCardRecord::named("Lightning Bolt", "LEA", 4);
        assert!(matches!(
            build_offline_card_exports(&[with_id, without_id]),
            Err(ExportError::MissingCatalogId { name }) if name == "Lightning Bolt"
        ));
    }

    #[test]
    fn card_csv_has_header_and_quoting() {
        let rows = vec![CardExport {
            name: "Borrowing 100,000 Arrows".to_string(),
            catalog_id: "10573".to_string(),
            quantity: 1,
        }];

        assert_eq!(
            to_csv(&CARD_HEADER, &rows),
            "Name,MultiverseID,Quantity\n\"Borrowing 100,000 Arrows\",10573,1\n"
        );
    }

    #[test]
    fn price_csv_formats_decimal_prices() {
        let rows = vec![PriceExport {
            name: "Llanowar Elves".to_string(),
            catalog_id: "5".to_string(),
            quantity: 2,
            price_usd: UsdPrice::parse("0.3").unwrap(),
        }];

        assert_eq!(
            to_csv(&PRICE_HEADER, &rows),
            "Name,MultiverseID,Quantity,Price\nLlanowar Elves,5,2,0.30\n"
        );
    }

    struct Unwritable;

    impl Serialize for Unwritable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot render row"))
        }
    }

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        value: Unwritable,
    }

    #[test]
    fn failed_render_leaves_existing_file_alone() {
        let mut existing = tempfile::NamedTempFile::new().unwrap();
        write!(existing, "previous run").unwrap();
        let rows = vec![Row {
            name: "Lightning Bolt",
            value: Unwritable,
        }];

        let result = write_csv_file(existing.path(), &["name", "value"], &rows);

        assert!(matches!(result, Err(ExportError::Csv(_))));
        assert_eq!(
            std::fs::read_to_string(existing.path()).unwrap(),
            "previous run"
        );
    }

    #[test]
    fn empty_export_still_has_header() {
        let rows: Vec<CardExport> = Vec::new();
        assert_eq!(to_csv(&CARD_HEADER, &rows), "Name,MultiverseID,Quantity\n");
    }
}
