//! Recoverable conditions collected during a run
//!
//! None of these stop the export. They are logged once the run finishes so
//! the user can see which cards did not make it into the CSV and why.

use crate::price::UsdPrice;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Scryfall returned the card without any multiverse id
    MissingCatalogId { name: String, set_code: String },
    /// A local card never showed up in any Scryfall response
    UnmatchedLocalRecord {
        name: String,
        set_code: Option<String>,
        quantity: u32,
    },
    /// Scryfall returned a card that matches no local entry; exported with quantity 0
    UnmatchedCatalogRecord {
        name: String,
        set_code: String,
        collector_number: String,
    },
    /// Scryfall returned the card for a local entry another card already
    /// claimed; exported with quantity 0
    RepeatedMatch {
        name: String,
        set_code: String,
        collector_number: String,
    },
    /// Two local entries share a join key; the later quantity wins
    DuplicateJoinKey {
        key: String,
        kept_quantity: u32,
        dropped_quantity: u32,
    },
    /// Price export skipped a card above the threshold
    AboveThreshold {
        name: String,
        price: UsdPrice,
        threshold: UsdPrice,
    },
}

impl Diagnostic {
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::AboveThreshold { .. } => log::Level::Info,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingCatalogId { name, set_code } => {
                write!(f, "cannot parse {} ({}): missing multiverse id", name, set_code)
            }
            Diagnostic::UnmatchedLocalRecord {
                name,
                set_code,
                quantity,
            } => match set_code {
                Some(set) => write!(f, "not found on Scryfall: {} x{} ({})", name, quantity, set),
                None => write!(f, "not found on Scryfall: {} x{}", name, quantity),
            },
            Diagnostic::UnmatchedCatalogRecord {
                name,
                set_code,
                collector_number,
            } => write!(
                f,
                "no local entry for {} ({} {}), exporting quantity 0",
                name, set_code, collector_number
            ),
            Diagnostic::RepeatedMatch {
                name,
                set_code,
                collector_number,
            } => write!(
                f,
                "{} ({} {}) matches an entry already exported, exporting quantity 0",
                name, set_code, collector_number
            ),
            Diagnostic::DuplicateJoinKey {
                key,
                kept_quantity,
                dropped_quantity,
            } => write!(
                f,
                "duplicate entry {}: quantity {} replaces {}",
                key, kept_quantity, dropped_quantity
            ),
            Diagnostic::AboveThreshold {
                name,
                price,
                threshold,
            } => write!(
                f,
                "excluded: above threshold: {} costs {} (max {})",
                name, price, threshold
            ),
        }
    }
}

/// Log every diagnostic at its own level.
pub fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        log::log!(diagnostic.level(), "{}", diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_exclusion_is_informational() {
        let diagnostic = Diagnostic::AboveThreshold {
            name: "Lightning Bolt".to_string(),
            price: UsdPrice::from_micros(1_250_000),
            threshold: UsdPrice::from_micros(800_000),
        };
        assert_eq!(diagnostic.level(), log::Level::Info);
        assert_eq!(
            diagnostic.to_string(),
            "excluded: above threshold: Lightning Bolt costs 1.25 (max 0.80)"
        );
    }

    #[test]
    fn lookup_problems_are_warnings() {
        let diagnostic = Diagnostic::MissingCatalogId {
            name: "Plains".to_string(),
            set_code: "sld".to_string(),
        };
        assert_eq!(diagnostic.level(), log::Level::Warn);
        assert!(diagnostic.to_string().contains("missing multiverse id"));
    }
}
