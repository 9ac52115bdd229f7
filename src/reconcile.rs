//! Joins Scryfall results back to the local card list
//!
//! The collection endpoint does not echo which identifier produced which
//! card, so every returned card is matched by keys rebuilt from the fields
//! Scryfall does return. Keys are tried from most to least specific:
//!
//! 1. any of the card's multiverse ids
//! 2. `(set, name, collector number)`
//! 3. `(set, name, *)`
//! 4. `(set, collector number)`
//!
//! Steps 2 and 3 are repeated with the front face name for double-faced
//! cards (`"Front // Back"`). The index is built once from the full local
//! list, so the outcome does not depend on the order cards come back in.
//!
//! Each local entry is exported at most once. When several returned cards
//! land on the same entry, the most specific match claims it and the rest
//! are exported with quantity 0.

use crate::diagnostics::Diagnostic;
use crate::models::{CatalogCardRecord, LocalCardRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

const FACE_SEPARATOR: &str = " // ";

/// Set + name + optional collector number, normalized for comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JoinKey {
    set_code: String,
    name: String,
    collector_number: Option<String>,
}

impl JoinKey {
    fn new(set_code: &str, name: &str, collector_number: Option<&str>) -> Self {
        Self {
            set_code: set_code.trim().to_uppercase(),
            name: name.trim().to_lowercase(),
            collector_number: collector_number.map(|cn| cn.trim().to_string()),
        }
    }

    fn wildcard(&self) -> Self {
        Self {
            collector_number: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}",
            self.name,
            self.set_code,
            self.collector_number.as_deref().unwrap_or("*")
        )
    }
}

/// Index entry. Primary entries come from a record's own key; secondary
/// ones are the wildcard copies of records that do know their number.
#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    primary: bool,
}

/// How a returned card found its local entry, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    CatalogId,
    Exact,
    Wildcard,
    SetNumber,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    index: usize,
    kind: MatchKind,
}

/// A catalog card paired with the local entry it matched, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCard {
    pub local: Option<LocalCardRecord>,
    pub catalog: CatalogCardRecord,
    /// First multiverse id of the catalog card
    pub catalog_id: String,
    /// Quantity of the matched local entry, 0 when nothing matched
    pub quantity: u32,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    /// In the order Scryfall returned the cards
    pub resolved: Vec<ResolvedCard>,
    /// Local entries no returned card matched, in input order
    pub unresolved: Vec<LocalCardRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

struct JoinIndex<'a> {
    records: &'a [LocalCardRecord],
    by_catalog_id: HashMap<String, usize>,
    by_key: HashMap<JoinKey, Slot>,
    by_set_number: HashMap<(String, String), usize>,
    /// Entries whose key a later entry took over
    shadowed: Vec<bool>,
}

impl<'a> JoinIndex<'a> {
    fn build(records: &'a [LocalCardRecord], diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut index = Self {
            records,
            by_catalog_id: HashMap::new(),
            by_key: HashMap::new(),
            by_set_number: HashMap::new(),
            shadowed: vec![false; records.len()],
        };

        for (i, record) in records.iter().enumerate() {
            if let Some(catalog_id) = record.catalog_id {
                if let Some(previous) = index.by_catalog_id.insert(catalog_id.to_string(), i) {
                    index.shadowed[previous] = true;
                    index.report_duplicate(
                        format!("multiverse id {}", catalog_id),
                        previous,
                        i,
                        diagnostics,
                    );
                }
            }

            let Some(set_code) = record.set_code.as_deref() else {
                continue;
            };
            let key = JoinKey::new(set_code, &record.name, record.collector_number.as_deref());
            index.insert_primary(key.clone(), i, diagnostics);

            if let Some(collector_number) = &key.collector_number {
                index.insert_secondary(key.wildcard(), i);
                index.insert_set_number(&key, collector_number, i, diagnostics);
            }
        }

        index
    }

    fn insert_primary(&mut self, key: JoinKey, index: usize, diagnostics: &mut Vec<Diagnostic>) {
        let slot = Slot {
            index,
            primary: true,
        };
        if let Some(previous) = self.by_key.insert(key.clone(), slot) {
            if previous.primary {
                self.shadowed[previous.index] = true;
                self.report_duplicate(key.to_string(), previous.index, index, diagnostics);
            }
        }
    }

    /// Same-name collisions were already reported through the exact key.
    fn insert_set_number(
        &mut self,
        key: &JoinKey,
        collector_number: &str,
        index: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let set_number = (key.set_code.clone(), collector_number.to_string());
        if let Some(previous) = self.by_set_number.insert(set_number, index) {
            if self.records[previous].name.trim().to_lowercase() != key.name {
                self.report_duplicate(
                    format!("({}) {}", key.set_code, collector_number),
                    previous,
                    index,
                    diagnostics,
                );
            }
        }
    }

    /// Wildcard copies never displace a record whose own key is the wildcard.
    fn insert_secondary(&mut self, key: JoinKey, index: usize) {
        let slot = Slot {
            index,
            primary: false,
        };
        match self.by_key.get(&key) {
            Some(existing) if existing.primary => {}
            _ => {
                self.by_key.insert(key, slot);
            }
        }
    }

    fn report_duplicate(
        &self,
        key: String,
        previous: usize,
        current: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        diagnostics.push(Diagnostic::DuplicateJoinKey {
            key,
            kept_quantity: self.records[current].quantity,
            dropped_quantity: self.records[previous].quantity,
        });
    }

    fn find(&self, card: &CatalogCardRecord) -> Option<Hit> {
        let hit = |index: usize, kind: MatchKind| Some(Hit { index, kind });

        if let Some(&i) = card
            .catalog_ids
            .iter()
            .find_map(|id| self.by_catalog_id.get(id.trim()))
        {
            return hit(i, MatchKind::CatalogId);
        }

        let collector_number = Some(card.collector_number.as_str()).filter(|cn| !cn.is_empty());
        let mut names = vec![card.name.as_str()];
        if let Some((front, _)) = card.name.split_once(FACE_SEPARATOR) {
            names.push(front);
        }

        for name in names {
            let exact = JoinKey::new(&card.set_code, name, collector_number);
            if let Some(slot) = self.by_key.get(&exact) {
                let kind = if exact.collector_number.is_some() {
                    MatchKind::Exact
                } else {
                    MatchKind::Wildcard
                };
                return hit(slot.index, kind);
            }
            if let Some(slot) = self.by_key.get(&exact.wildcard()) {
                return hit(slot.index, MatchKind::Wildcard);
            }
        }

        let collector_number = collector_number?;
        let i = *self.by_set_number.get(&(
            card.set_code.trim().to_uppercase(),
            collector_number.trim().to_string(),
        ))?;
        hit(i, MatchKind::SetNumber)
    }
}

/// Ordering used when several cards land on one local entry. Depends only
/// on card content so the winner is the same for any response order.
fn claim_rank<'c>(
    kind: MatchKind,
    catalog_id: &'c str,
    card: &'c CatalogCardRecord,
) -> (MatchKind, &'c str, &'c str, &'c str) {
    (kind, catalog_id, card.collector_number.as_str(), card.name.as_str())
}

/// Pair each returned card with the local entry that asked for it.
///
/// Cards without a multiverse id are dropped with a diagnostic. Cards that
/// match no local entry, or whose entry another card already claimed, are
/// kept with quantity 0. Local entries nothing matched end up in
/// `unresolved`, except those whose key a later duplicate took over.
pub fn reconcile(
    local_records: &[LocalCardRecord],
    catalog_records: Vec<CatalogCardRecord>,
) -> Reconciliation {
    let mut diagnostics = Vec::new();
    let index = JoinIndex::build(local_records, &mut diagnostics);

    let mut candidates = Vec::with_capacity(catalog_records.len());
    for card in catalog_records {
        let Some(catalog_id) = card.catalog_ids.first().cloned() else {
            diagnostics.push(Diagnostic::MissingCatalogId {
                name: card.name.clone(),
                set_code: card.set_code.clone(),
            });
            continue;
        };
        let hit = index.find(&card);
        candidates.push((card, catalog_id, hit));
    }

    // local index -> position of the card that claims it
    let mut claims: HashMap<usize, usize> = HashMap::new();
    for (position, (card, catalog_id, hit)) in candidates.iter().enumerate() {
        let Some(hit) = hit else {
            continue;
        };
        match claims.entry(hit.index) {
            Entry::Vacant(entry) => {
                entry.insert(position);
            }
            Entry::Occupied(mut entry) => {
                let (held_card, held_id, held_hit) = &candidates[*entry.get()];
                let held_kind = held_hit.map_or(MatchKind::SetNumber, |h| h.kind);
                if claim_rank(hit.kind, catalog_id, card)
                    < claim_rank(held_kind, held_id, held_card)
                {
                    entry.insert(position);
                }
            }
        }
    }

    let mut matched = vec![false; local_records.len()];
    let mut resolved = Vec::with_capacity(candidates.len());

    for (position, (card, catalog_id, hit)) in candidates.into_iter().enumerate() {
        let local = match hit {
            Some(hit) if claims.get(&hit.index) == Some(&position) => {
                matched[hit.index] = true;
                Some(local_records[hit.index].clone())
            }
            Some(_) => {
                diagnostics.push(Diagnostic::RepeatedMatch {
                    name: card.name.clone(),
                    set_code: card.set_code.clone(),
                    collector_number: card.collector_number.clone(),
                });
                None
            }
            None => {
                diagnostics.push(Diagnostic::UnmatchedCatalogRecord {
                    name: card.name.clone(),
                    set_code: card.set_code.clone(),
                    collector_number: card.collector_number.clone(),
                });
                None
            }
        };

        resolved.push(ResolvedCard {
            quantity: local.as_ref().map_or(0, |l| l.quantity),
            local,
            catalog: card,
            catalog_id,
        });
    }

    let unresolved: Vec<LocalCardRecord> = local_records
        .iter()
        .enumerate()
        .filter(|(i, _)| !matched[*i] && !index.shadowed[*i])
        .map(|(_, record)| record.clone())
        .collect();

    diagnostics.extend(unresolved.iter().map(|record| Diagnostic::UnmatchedLocalRecord {
        name: record.name.clone(),
        set_code: record.set_code.clone(),
        quantity: record.quantity,
    }));

    log::info!(
        "Reconciled {} cards, {} local entries unmatched",
        resolved.len(),
        unresolved.len()
    );

    Reconciliation {
        resolved,
        unresolved,
        diagnostics,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
