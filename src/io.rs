//! Input readers
//!
//! Three formats are understood:
//! - plain card lists, one `4 Lightning Bolt (LEA) 161` per line
//! - deck JSON exports with `commander` and `mainBoard` sections
//! - CSVs previously written by this tool (`Name,MultiverseID,Quantity`)
//!
//! Every record is validated before it is returned, so a bad line fails the
//! run before anything is sent to Scryfall.

use crate::error::{ExportError, Result};
use crate::models::{IdValue, LocalCardRecord};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

lazy_static! {
    static ref CARD_LINE: Regex = Regex::new(
        r"^(?P<quantity>\d+)x?\s+(?P<name>.+?)\s+\((?P<set>[^)]+)\)(?:\s+(?P<collector>[^\s*()]+))?(?:\s+\*[A-Za-z]+\*)*\s*$"
    )
    .expect("card line pattern is valid");
}

const SECTION_HEADERS: [&str; 5] = ["deck", "sideboard", "commander", "companion", "maybeboard"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// `<qty> <name> (<set>) [<collector>]` per line
    CardList,
    /// Deck JSON with commander and mainBoard sections
    DeckJson,
    /// Name,MultiverseID,Quantity CSV
    ExportCsv,
}

impl InputFormat {
    /// Guess the format from the file extension, defaulting to a card list
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => InputFormat::DeckJson,
            Some("csv") => InputFormat::ExportCsv,
            _ => InputFormat::CardList,
        }
    }
}

pub fn read_local_records<P: AsRef<Path>>(
    path: P,
    format: Option<InputFormat>,
) -> Result<Vec<LocalCardRecord>> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    log::info!("Reading {:?} from {}", format, path.display());

    let records = match format {
        InputFormat::CardList => read_card_list(path)?,
        InputFormat::DeckJson => read_deck_json(path)?,
        InputFormat::ExportCsv => read_export_csv(path)?,
    };

    log::info!("Read {} card entries", records.len());
    Ok(records)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_skippable(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("//")
        || line.starts_with('#')
        || SECTION_HEADERS
            .iter()
            .any(|header| line.trim_end_matches(':').eq_ignore_ascii_case(header))
}

/// Parse one card list line. `Ok(None)` for blank lines, comments and section headers.
pub fn parse_card_line(
    line: &str,
    source: &str,
    line_number: usize,
) -> Result<Option<LocalCardRecord>> {
    let line = line.trim();
    if is_skippable(line) {
        return Ok(None);
    }

    let invalid = |reason: String| ExportError::InvalidRecord {
        source_name: source.to_string(),
        line: line_number,
        reason,
    };

    let captures = CARD_LINE.captures(line).ok_or_else(|| {
        invalid(format!(
            "expected '<qty> <name> (<set>) [<collector>]', got '{}'",
            line
        ))
    })?;

    let quantity: u32 = captures["quantity"]
        .parse()
        .map_err(|_| invalid(format!("quantity out of range in '{}'", line)))?;

    let record = LocalCardRecord {
        name: captures["name"].to_string(),
        set_code: Some(captures["set"].trim().to_uppercase()),
        collector_number: captures.name("collector").map(|m| m.as_str().to_string()),
        catalog_id: None,
        quantity,
    };
    record.validate(source, line_number)?;
    Ok(Some(record))
}

pub fn read_card_list(path: &Path) -> Result<Vec<LocalCardRecord>> {
    let source = source_name(path);
    let reader = io::BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        if let Some(record) = parse_card_line(&line?, &source, index + 1)? {
            records.push(record);
        }
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct DeckFile {
    data: DeckData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckData {
    #[serde(default)]
    commander: Vec<DeckCard>,
    #[serde(default)]
    main_board: Vec<DeckCard>,
}

#[derive(Debug, Deserialize)]
struct DeckCard {
    name: String,
    #[serde(default)]
    identifiers: DeckCardIdentifiers,
    count: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DeckCardIdentifiers {
    multiverse_id: Option<IdValue>,
}

/// Parse a deck JSON document; commander cards come first, then the main board.
pub fn parse_deck_json(content: &str, source: &str) -> Result<Vec<LocalCardRecord>> {
    let deck: DeckFile = serde_json::from_str(content).map_err(ExportError::InputJson)?;
    let cards = deck.data.commander.into_iter().chain(deck.data.main_board);

    let mut records = Vec::new();
    for (index, card) in cards.enumerate() {
        let entry = index + 1;
        let catalog_id = match card.identifiers.multiverse_id.map(IdValue::into_string) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ExportError::InvalidRecord {
                source_name: source.to_string(),
                line: entry,
                reason: format!("invalid multiverse id '{}' for {}", raw, card.name),
            })?),
            None => None,
        };

        let record = LocalCardRecord {
            name: card.name,
            set_code: None,
            collector_number: None,
            catalog_id,
            quantity: card.count,
        };
        record.validate(source, entry)?;
        records.push(record);
    }

    Ok(records)
}

pub fn read_deck_json(path: &Path) -> Result<Vec<LocalCardRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_deck_json(&content, &source_name(path))
}

#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "MultiverseID")]
    multiverse_id: u64,
    #[serde(rename = "Quantity")]
    quantity: u32,
}

/// Read a `Name,MultiverseID,Quantity` CSV, e.g. to re-price an earlier export
pub fn read_export_csv(path: &Path) -> Result<Vec<LocalCardRecord>> {
    let source = source_name(path);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row: ExportRow = result.map_err(|e| ExportError::InvalidRecord {
            source_name: source.clone(),
            line,
            reason: e.to_string(),
        })?;

        let record = LocalCardRecord {
            name: row.name,
            set_code: None,
            collector_number: None,
            catalog_id: Some(row.multiverse_id),
            quantity: row.quantity,
        };
        record.validate(&source, line)?;
        records.push(record);
    }

    Ok(records)
}
