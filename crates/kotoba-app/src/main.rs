use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use kotoba_anki::{Deck, fixed_path};
use kotoba_config::Config;
use kotoba_core::{DictionaryStore, LookupContext};
use kotoba_dictionary::JsonStore;
use kotoba_lang_japanese::{JapaneseProcessor, TermBankLoader, WeblioLookup};
use kotoba_remote::RemoteSources;
use kotoba_types::SourceResults;
use tracing_subscriber::EnvFilter;

mod pipeline;
mod profile;

use self::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "kotoba", version, about = "Monolingual Japanese definitions for flashcard decks")]
struct Cli {
    /// JSON config file; defaults plus KOTOBA_* variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding the dictionary index and caches
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Never contact remote dictionaries
    #[arg(long, global = true)]
    offline: bool,

    /// JSON logs, and JSON output for `lookup`
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the definition column of tab-separated deck exports
    Convert {
        #[arg(required = true)]
        decks: Vec<PathBuf>,
    },
    /// Print the ranked entries for one headword
    Lookup { word: String, reading: Option<String> },
    /// Import term-bank dictionary folders into the index
    Import {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = profile::load_config(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.dictionary.data_dir = dir.display().to_string();
    }
    if cli.offline {
        config.remote.enabled = false;
    }

    let store = JsonStore::new(&config.dictionary.data_dir);
    let mut ctx = store
        .load()
        .with_context(|| format!("Failed to load {}", store.dir().display()))?;
    let loader = TermBankLoader::default();

    match cli.command {
        Command::Import { dirs } => {
            for dir in &dirs {
                let added = loader.load_dir(&mut ctx, dir)?;
                tracing::info!("Imported {added} definitions from {}", dir.display());
            }
            store.save(&ctx)?;
        }
        Command::Lookup { word, reading } => {
            import_configured(&loader, &store, &mut ctx, &config)?;
            let remote = remote_sources(&config, &store);
            let processor = JapaneseProcessor::new(&config);

            let reading = processor.clean_reading(reading.as_deref().unwrap_or_default());
            let word = processor.clean_headword(&word);
            let results = processor.convert(&mut ctx, Some(&remote), &word, &reading);
            print_results(&results, cli.json)?;
            store.save(&ctx)?;
        }
        Command::Convert { decks } => {
            import_configured(&loader, &store, &mut ctx, &config)?;
            let remote = remote_sources(&config, &store);
            let processor = JapaneseProcessor::new(&config);
            let pipeline = Pipeline::new(&processor, Some(&remote), config.anki.text_mode_default);

            for path in &decks {
                let result = convert_deck(&pipeline, &mut ctx, &config, path);
                // Discoveries are kept even when a deck fails
                store.save(&ctx)?;
                result?;
            }
        }
    }

    Ok(())
}

/// Imports configured dictionary folders the index does not hold yet
fn import_configured(
    loader: &TermBankLoader,
    store: &JsonStore,
    ctx: &mut LookupContext,
    config: &Config,
) -> anyhow::Result<()> {
    let mut imported = false;
    for path in &config.dictionary.import_paths {
        let dir = Path::new(path);
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Ignoring import path {path}");
            continue;
        };
        if ctx.index.has_source(name) {
            continue;
        }
        loader.load_dir(ctx, dir)?;
        imported = true;
    }

    if imported {
        store.save(ctx)?;
    }
    Ok(())
}

fn remote_sources<'s>(config: &Config, store: &'s JsonStore) -> RemoteSources<'s> {
    if !config.remote.enabled {
        tracing::info!("Remote lookups disabled");
        return RemoteSources::disabled();
    }

    match WeblioLookup::new(&config.remote) {
        Ok(weblio) => RemoteSources::new(Some(store)).with_provider(weblio),
        Err(e) => {
            tracing::warn!("Weblio unavailable, continuing offline: {e}");
            RemoteSources::disabled()
        }
    }
}

fn convert_deck(
    pipeline: &Pipeline<'_>,
    ctx: &mut LookupContext,
    config: &Config,
    path: &Path,
) -> anyhow::Result<()> {
    tracing::info!("Converting {}...", path.display());
    let mut deck = Deck::read(path)?;
    let columns = deck.columns(&config.anki)?;

    pipeline.convert_deck(ctx, &mut deck, columns);

    let output = fixed_path(path);
    deck.write(&output)?;
    tracing::info!("Conversion complete, wrote {}", output.display());
    Ok(())
}

fn print_results(results: &SourceResults, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No entries found");
    }
    for (label, entries) in results {
        println!("== {label}");
        for entry in entries {
            let guess = if entry.is_guess() { " (guess)" } else { "" };
            println!("{}【{}】{guess}", entry.display_word(), entry.reading);
            for definition in &entry.definitions {
                println!("{definition}\n");
            }
        }
    }
    Ok(())
}
