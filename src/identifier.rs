//! Scryfall collection identifiers
//!
//! Each variant serializes to exactly the keys the `/cards/collection`
//! endpoint expects for it. Scryfall rejects identifiers with mixed keys.

use crate::models::LocalCardRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LookupIdentifier {
    ByCatalogId {
        multiverse_id: u64,
    },
    BySetAndCollectorNumber {
        set: String,
        collector_number: String,
    },
    ByNameAndSet {
        name: String,
        set: String,
    },
}

/// Pick the identifier for a record: catalog id, then collector number, then name.
///
/// The record must already have passed [`LocalCardRecord::validate`].
pub fn derive_identifier(record: &LocalCardRecord) -> LookupIdentifier {
    if let Some(multiverse_id) = record.catalog_id {
        return LookupIdentifier::ByCatalogId { multiverse_id };
    }

    let set = record.set_code.clone().unwrap_or_default();
    match &record.collector_number {
        Some(collector_number) => LookupIdentifier::BySetAndCollectorNumber {
            set,
            collector_number: collector_number.clone(),
        },
        None => LookupIdentifier::ByNameAndSet {
            name: record.name.clone(),
            set,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_id_wins_over_everything_else() {
        let record = LocalCardRecord::named("Lightning Bolt", "LEA", 4)
            .with_collector_number("161")
            .with_catalog_id(3255);

        assert_eq!(
            derive_identifier(&record),
            LookupIdentifier::ByCatalogId {
                multiverse_id: 3255
            }
        );
    }

    #[test]
    fn collector_number_wins_over_name() {
        let record =
            LocalCardRecord::named("Lightning Bolt", "LEA", 4).with_collector_number("161");

        assert_eq!(
            derive_identifier(&record),
            LookupIdentifier::BySetAndCollectorNumber {
                set: "LEA".to_string(),
                collector_number: "161".to_string(),
            }
        );
    }

    #[test]
    fn falls_back_to_name_and_set() {
        let record = LocalCardRecord::named("Lightning Bolt", "LEA", 4);

        assert_eq!(
            derive_identifier(&record),
            LookupIdentifier::ByNameAndSet {
                name: "Lightning Bolt".to_string(),
                set: "LEA".to_string(),
            }
        );
    }

    #[test]
    fn serializes_only_the_variant_keys() {
        let by_id = serde_json::to_value(LookupIdentifier::ByCatalogId {
            multiverse_id: 3255,
        })
        .unwrap();
        assert_eq!(by_id, json!({ "multiverse_id": 3255 }));

        let by_number = serde_json::to_value(LookupIdentifier::BySetAndCollectorNumber {
            set: "LEA".to_string(),
            collector_number: "161".to_string(),
        })
        .unwrap();
        assert_eq!(by_number, json!({ "set": "LEA", "collector_number": "161" }));

        let by_name = serde_json::to_value(LookupIdentifier::ByNameAndSet {
            name: "Lightning Bolt".to_string(),
            set: "LEA".to_string(),
        })
        .unwrap();
        assert_eq!(by_name, json!({ "name": "Lightning Bolt", "set": "LEA" }));
    }
}
