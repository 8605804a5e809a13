//! boox-import
//!
//! Import Boox reading notes into Zotero's EPUB reader as highlights.

use anyhow::{bail, Context};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boox_import::config::{Config, HighlightColor, CONFIDENCE_THRESHOLD};
use boox_import::epub::EpubBook;
use boox_import::import::{import_notes, ImportOptions};
use boox_import::notes::NotesFile;
use boox_import::zotero::{backup_database, find_epub, open_database, ZoteroPaths, ZoteroPrefs};

#[derive(Parser, Debug)]
#[command(
    name = "boox-import",
    version,
    about = "Import Boox annotations into Zotero",
    after_help = "Examples:\n  boox-import annotations.txt\n  boox-import --debug annotations.txt"
)]
struct Args {
    /// Annotation file to import
    notes_file: PathBuf,
    /// Enable debug logging
    #[arg(long)]
    debug: bool,
    /// Path to Zotero data directory
    #[arg(long, value_name = "PATH")]
    zotero_dir: Option<PathBuf>,
    /// Highlight color for imported annotations
    #[arg(long, value_enum)]
    highlight_color: Option<HighlightColor>,
    /// Accept low-confidence book matches without asking
    #[arg(long, short = 'y')]
    yes: bool,
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let prefs = ZoteroPrefs::load();
    let paths = ZoteroPaths::resolve(args.zotero_dir.as_deref(), &config, prefs.as_ref());
    let db_path = paths.database();
    if !db_path.is_file() {
        bail!("Database not found: {}", db_path.display());
    }

    let notes_path = &args.notes_file;
    if !notes_path.is_file() {
        bail!("File not found: {}", notes_path.display());
    }
    let NotesFile {
        book_identifier,
        mut notes,
    } = NotesFile::load(notes_path)?;
    tracing::debug!("Searching for book: {}", book_identifier);

    let pool = open_database(&db_path).await?;
    let found = match find_epub(&pool, &book_identifier).await {
        Ok(found) => found,
        Err(e) if e.is_database_locked() => {
            bail!("Database is locked. Please close Zotero and try again.")
        }
        Err(e) => return Err(e.into()),
    };
    let Some(found) = found else {
        tracing::error!("Ensure the EPUB is imported and filename matches");
        bail!("EPUB not found in Zotero database: {}", book_identifier);
    };

    if found.confidence < CONFIDENCE_THRESHOLD {
        tracing::warn!(
            "Found potential match with {:.0}% confidence:",
            found.confidence * 100.0
        );
        tracing::warn!("  File: {}", found.attachment.filename());
        tracing::warn!("  Match method: {}", found.method);
        tracing::warn!("  Searching for: {}", book_identifier);

        if !args.yes && !confirm("Is this the correct EPUB?")? {
            bail!("Match rejected by user. Please check the EPUB filename.");
        }
        tracing::info!("Match confirmed.");
    }

    tracing::info!("Located EPUB: {}", found.attachment.filename());
    tracing::debug!("  Attachment ID: {}", found.attachment.item_id);
    tracing::debug!("  Parent ID: {:?}", found.attachment.parent_item_id);

    let epub_path = paths.attachment_file(&found.attachment.key, &found.attachment.path);
    if !epub_path.is_file() {
        tracing::error!("Check Zotero storage directory: {}", paths.storage_dir().display());
        bail!("EPUB file missing: {}", epub_path.display());
    }
    let book = EpubBook::open(&epub_path)
        .with_context(|| format!("Failed to open {}", epub_path.display()))?;

    tracing::info!("Parsed {} annotation(s)", notes.len());
    if notes.is_empty() {
        tracing::warn!("No annotations found");
        return Ok(());
    }

    let backup = backup_database(&db_path)?;
    tracing::debug!("Database backup created at: {}", backup.display());

    let color = args.highlight_color.unwrap_or(config.highlight_color);
    let options = ImportOptions {
        parent_item_id: found.attachment.item_id,
        library_id: config.zotero.library_id,
        color: color.hex().to_string(),
    };

    let summary = match import_notes(&pool, &book, &mut notes, &options).await {
        Ok(summary) => summary,
        Err(e) if e.is_database_locked() => {
            bail!("Database is locked. Please close Zotero and try again.")
        }
        Err(e) => return Err(e.into()),
    };
    pool.close().await;

    tracing::info!(
        "Imported: {} | Skipped: {} | Failed: {}",
        summary.inserted,
        summary.duplicates,
        summary.failed
    );
    tracing::info!(
        "Located: {} exact, {} fuzzy, {} by page",
        summary.located_exact,
        summary.located_fuzzy,
        summary.fallback
    );
    if summary.inserted > 0 {
        tracing::info!("Restart Zotero to see the imported annotations");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let default_filter = if args.debug {
        "boox_import=debug"
    } else {
        "boox_import=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
