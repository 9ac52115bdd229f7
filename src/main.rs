//! MTG Export - card list to importable CSV
//!
//! Looks every card of a list up on Scryfall and writes multiverse ids with
//! quantities (`cards`) or with prices under a threshold (`prices`).

use clap::{Parser, Subcommand};
use mtg_export::diagnostics;
use mtg_export::export::{build_offline_card_exports, write_card_exports, write_price_exports};
use mtg_export::scryfall::{COLLECTION_URL, MAX_IDENTIFIERS_PER_REQUEST};
use mtg_export::{
    export_cards, export_prices, read_local_records, BatchLookupClient, InputFormat,
    LookupConfig, Result, UsdPrice,
};
use std::path::PathBuf;

/// Resolve MTG card lists against Scryfall and export them as CSV
#[derive(Parser, Debug)]
#[command(name = "mtg_export")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scryfall collection endpoint
    #[arg(long, global = true, default_value = COLLECTION_URL)]
    api_url: String,

    /// Identifiers per request (Scryfall accepts at most 75)
    #[arg(long, global = true, default_value_t = MAX_IDENTIFIERS_PER_REQUEST)]
    chunk_size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct FileArgs {
    /// Card list, deck JSON or earlier export CSV
    input: PathBuf,

    /// Where to write the CSV
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Input format (default: guessed from the file extension)
    #[arg(long, value_enum)]
    format: Option<InputFormat>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export Name,MultiverseID,Quantity
    Cards {
        #[command(flatten)]
        files: FileArgs,

        /// Use multiverse ids from the input as-is, without asking Scryfall
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Export Name,MultiverseID,Quantity,Price for cards at or below a price
    Prices {
        #[command(flatten)]
        files: FileArgs,

        /// Highest USD price to include
        #[arg(short = 'p', long = "max-price", default_value = "0.8")]
        max_price: UsdPrice,
    },
}

fn main() {
    // Set RUST_LOG to control verbosity, e.g. RUST_LOG=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("Export failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = LookupConfig {
        api_url: args.api_url,
        chunk_size: args.chunk_size,
        ..Default::default()
    };

    match args.command {
        Command::Cards { files, offline } => {
            let records = read_local_records(&files.input, files.format)?;

            let rows = if offline {
                log::info!("Offline mode, using multiverse ids from {}", files.input.display());
                build_offline_card_exports(&records)?
            } else {
                let client = BatchLookupClient::from_config(&config)?;
                let outcome = export_cards(&client, &records)?;
                diagnostics::report(&outcome.diagnostics);
                log_summary(outcome.rows.len(), outcome.unresolved.len());
                outcome.rows
            };

            write_card_exports(&files.output, &rows)
        }
        Command::Prices { files, max_price } => {
            let records = read_local_records(&files.input, files.format)?;
            let client = BatchLookupClient::from_config(&config)?;
            let outcome = export_prices(&client, &records, max_price)?;
            diagnostics::report(&outcome.diagnostics);
            log_summary(outcome.rows.len(), outcome.unresolved.len());

            write_price_exports(&files.output, &outcome.rows)
        }
    }
}

fn log_summary(exported: usize, unresolved: usize) {
    if unresolved > 0 {
        log::warn!(
            "{} cards exported, {} entries could not be resolved",
            exported,
            unresolved
        );
    } else {
        log::info!("{} cards exported", exported);
    }
}
