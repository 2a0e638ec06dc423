//! Save Inspect Example
//!
//! Drives the slot manager against a directory of `.sav` files.
//!
//! ```text
//! save_inspect <dir> inspect
//! save_inspect <dir> export <bundle-file>
//! save_inspect <dir> import <bundle-file> [--yes]
//! ```
//!
//! `--catalog <file.ron>` and `--config <file.ron>` replace the built-in
//! species catalog and engine settings. The bundle key is read from
//! `VOIDSAVE_KEY`. Set `RUST_LOG=debug` to see every storage write.

use log::info;
use std::error::Error;
use std::fs;
use std::sync::Arc;
use voidsave_bundle::{AesCipher, BundleKey, Cipher, Exporter, ImportSummary, Importer};
use voidsave_core::StaticCatalog;
use voidsave_db::FileStorage;
use voidsave_migrate::Migrator;
use voidsave_slots::{catalog_from_ron_str, load_catalog, EngineConfig, SlotId, SlotManager};

const DEFAULT_CATALOG: &str = r#"
(
    species: [
        (id: 1, class: Regular, starter: true),
        (id: 4, class: Regular, starter: true),
        (id: 7, class: Regular, starter: true),
        (id: 144, class: SubLegendary),
        (id: 150, class: Legendary),
        (id: 151, class: Mythical),
    ],
)
"#;

struct Args {
    dir: String,
    command: String,
    file: Option<String>,
    yes: bool,
    catalog: Option<String>,
    config: Option<String>,
}

fn parse_args() -> Option<Args> {
    let mut positional = Vec::new();
    let mut yes = false;
    let mut catalog = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--yes" => yes = true,
            "--catalog" => catalog = Some(args.next()?),
            "--config" => config = Some(args.next()?),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    Some(Args {
        dir: positional.next()?,
        command: positional.next()?,
        file: positional.next(),
        yes,
        catalog,
        config,
    })
}

fn usage() {
    eprintln!("usage: save_inspect <dir> inspect|export <file>|import <file> [--yes]");
    eprintln!("       [--catalog <catalog.ron>] [--config <engine.ron>]");
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let Some(args) = parse_args() else {
        usage();
        std::process::exit(2);
    };

    let catalog: StaticCatalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => catalog_from_ron_str(DEFAULT_CATALOG)?,
    };
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let storage = FileStorage::open(&args.dir)?;
    let migrator = Arc::new(Migrator::new(Arc::new(catalog)));
    let manager = SlotManager::new(storage, migrator.clone(), config);

    let cipher: Arc<dyn Cipher> = Arc::new(AesCipher);
    let key = BundleKey::new(std::env::var("VOIDSAVE_KEY").unwrap_or_else(|_| "voidsave".into()));

    match args.command.as_str() {
        "inspect" => inspect(&manager)?,
        "export" => {
            let Some(path) = args.file else {
                usage();
                std::process::exit(2);
            };
            let exporter = Exporter::new(cipher, key);
            let sealed = manager.export_bundle(&exporter)?;
            fs::write(&path, &sealed)?;
            println!("Wrote {} bytes to {}", sealed.len(), path);
        }
        "import" => {
            let Some(path) = args.file else {
                usage();
                std::process::exit(2);
            };
            let importer = Importer::new(cipher, key, migrator)
                .with_history_capacity(manager.config().run_history_capacity);
            let sealed = fs::read(&path)?;
            let yes = args.yes;
            let mut confirm = |summary: &ImportSummary| {
                print_summary(summary);
                if !yes {
                    println!("Re-run with --yes to overwrite the saves in this directory.");
                }
                yes
            };
            if manager.import_bundle(&importer, &sealed, &mut confirm)? {
                println!("Import applied.");
            } else {
                println!("Import not applied.");
            }
        }
        _ => {
            usage();
            std::process::exit(2);
        }
    }
    Ok(())
}

fn inspect(manager: &SlotManager<FileStorage>) -> Result<(), Box<dyn Error>> {
    let stored = manager.storage().keys()?;
    info!("stored keys: {:?}", stored);

    let profile = manager.load_profile()?;
    let caught = profile.dex.values().filter(|e| e.is_caught()).count();
    println!("=== Profile ===");
    println!("  Trainer ID:   {}", profile.trainer_id);
    println!("  Saved at:     {}", profile.timestamp);
    println!("  Dex entries:  {} ({} caught)", profile.dex.len(), caught);
    println!("  Starters:     {}", profile.starters.len());
    println!("  Perma money:  {}", profile.perma_money);
    println!("  Quests:       {}", profile.quests.len());

    println!("\n=== Sessions ===");
    let sessions = manager.load_sessions()?;
    for slot in SlotId::all() {
        match &sessions[slot.index()] {
            Some(session) => println!(
                "  [{}] wave {} mode {} saved at {}",
                slot, session.wave_index, session.game_mode, session.timestamp
            ),
            None => println!("  [{}] empty", slot),
        }
    }
    if let Some(slot) = manager.most_recent_slot()? {
        println!("  Most recent: slot {}", slot);
    }

    let history = manager.load_run_history()?;
    println!("\n=== Run history ({}/{}) ===", history.len(), history.capacity());
    for (timestamp, run) in history.iter() {
        println!(
            "  {} wave {}{}{}",
            timestamp,
            run.session.wave_index,
            if run.is_victory { " victory" } else { "" },
            if run.is_favorite { " *" } else { "" },
        );
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!("=== Import ({:?}) ===", summary.kind);
    if let Some(trainer_id) = summary.trainer_id {
        println!("  Trainer ID:  {}", trainer_id);
    }
    if let Some(dex_size) = summary.dex_size {
        println!("  Dex entries: {}", dex_size);
    }
    for session in &summary.sessions {
        println!(
            "  Slot {}: wave {} saved at {}",
            session.slot, session.wave_index, session.timestamp
        );
    }
    if !summary.migrated.is_empty() {
        println!("  Migrated:    {}", summary.migrated.join(", "));
    }
}
