//! Unit statement redaction CLI.
//!
//! Processes statement batches into per-unit bundles, browses the storage
//! archive and dumps PDF words for debugging.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use unit_redactor::document::extract_pages;
use unit_redactor::storage::{browse, download_zip, open_store, upload_bundles};
use unit_redactor::{
    run_batch, BatchOutcome, BatchRequest, Config, MaskingMode, PageSelection, ProcessingOptions,
    ReportingPeriod, Roster, StatementKind, Upload,
};

/// Unit Statement Redaction Tool
///
/// Highlight or mask each unit's employees in bank, PF and ESIC statements
/// and package one bundle per unit.
#[derive(Parser)]
#[command(name = "unit-redactor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process statements into per-unit bundles
    Process(ProcessArgs),

    /// Browse or download archived bundles
    Archive {
        #[command(subcommand)]
        command: ArchiveCommand,
    },

    /// Dump the words of a PDF with their boxes (for debugging layouts)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// Statement kind: bank, pf or esic
    #[arg(short, long)]
    kind: StatementKind,

    /// Roster spreadsheet mapping units to identifiers
    #[arg(short, long, value_name = "FILE")]
    roster: PathBuf,

    /// Reporting month (Mar, march or 3)
    #[arg(long)]
    month: String,

    /// Reporting year
    #[arg(long)]
    year: i32,

    /// mask: cover everything but the unit's matches; highlight: mark matches only
    #[arg(long, default_value = "mask")]
    mode: MaskingMode,

    /// all: every page for every unit; relevant: first, last and matching pages
    #[arg(long, default_value = "all")]
    pages: PageSelection,

    /// Parallel workers (overrides the config file)
    #[arg(long)]
    workers: Option<usize>,

    /// Mirror the bundles to the configured storage backend
    #[arg(long)]
    upload: bool,

    /// Output zip (defaults to <Mon>-<Year>.zip)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Statement PDFs
    #[arg(required = true, value_name = "PDF")]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum ArchiveCommand {
    /// List one folder level with sizes
    List {
        #[arg(short, long)]
        kind: StatementKind,

        /// Folder to list (defaults to the kind's root folder)
        #[arg(long)]
        path: Option<String>,

        /// Case-insensitive folder name filter
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Download folders and files as one zip
    Download {
        /// Folder prefix to include (repeatable)
        #[arg(long = "prefix", value_name = "PREFIX")]
        prefixes: Vec<String>,

        /// Object key to include (repeatable)
        #[arg(long = "file", value_name = "KEY")]
        files: Vec<String>,

        /// Output zip
        #[arg(short, long, value_name = "FILE", default_value = "selected_items.zip")]
        output: PathBuf,
    },
}

/// Command handler carrying the loaded configuration.
struct CommandHandler {
    config: Config,
    verbose: bool,
}

impl CommandHandler {
    fn new(config: Config, verbose: bool) -> Self {
        Self { config, verbose }
    }

    /// Runs a batch, writes the master zip and optionally uploads it.
    async fn process(&self, args: ProcessArgs) -> Result<()> {
        let period = ReportingPeriod::parse(&args.month, args.year, Local::now().date_naive())
            .context("Invalid reporting period")?;

        if !args.roster.exists() {
            anyhow::bail!("Roster file does not exist: {}", args.roster.display());
        }
        for input in &args.inputs {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {}", input.display());
            }
        }

        let roster = Roster::from_path(&args.roster, args.kind)
            .with_context(|| format!("Failed to read roster {}", args.roster.display()))?;
        let uploads = args
            .inputs
            .iter()
            .map(|path| Upload::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;

        let options = ProcessingOptions {
            mode: args.mode,
            pages: args.pages,
            workers: args.workers.unwrap_or(self.config.processing.workers),
        };

        if self.verbose {
            println!("Kind:    {}", args.kind);
            println!("Period:  {period}");
            println!("Units:   {}", roster.units().len());
            println!("Inputs:  {} statement(s)", uploads.len());
            println!("Mode:    {} / {} pages", options.mode, options.pages);
        }

        let request = BatchRequest {
            roster,
            uploads,
            options,
            period,
        };
        let outcome = tokio::task::spawn_blocking(move || run_batch(&request))
            .await
            .context("Batch worker stopped unexpectedly")?
            .context("Batch processing failed")?;

        let output = args
            .output
            .unwrap_or_else(|| PathBuf::from(outcome.archive_name()));
        let archive = outcome
            .master_archive()
            .context("Failed to package unit bundles")?;
        std::fs::write(&output, archive)
            .with_context(|| format!("Failed to write to {}", output.display()))?;

        self.report(&outcome, &output);

        if args.upload {
            let store = open_store(&self.config.storage).await;
            match upload_bundles(store.as_ref(), &outcome).await {
                Ok(keys) => println!(
                    "✓ Uploaded {} object(s) to {}",
                    keys.len(),
                    store.describe()
                ),
                Err(e) => {
                    warn!("Upload to {} failed: {e}", store.describe());
                    println!("⚠ Upload failed, local archive kept: {e}");
                }
            }
        }

        Ok(())
    }

    fn report(&self, outcome: &BatchOutcome, output: &Path) {
        if self.verbose {
            println!("\nBatch Summary:");
            println!("  Documents processed: {}", outcome.stats.documents);
            println!("  Pages processed:     {}", outcome.stats.pages);
            println!("  Highlights:          {}", outcome.stats.highlights);
            println!("  Masks:               {}", outcome.stats.masks);
            println!(
                "  Elapsed:             {:.2}s",
                outcome.stats.elapsed.as_secs_f64()
            );
            for bundle in &outcome.bundles {
                println!(
                    "  {}: {} matched identifier(s)",
                    bundle.unit,
                    bundle.matched_ids.len()
                );
            }
        }

        println!(
            "✓ Wrote {} unit bundle(s) → {}",
            outcome.bundles.len(),
            output.display()
        );
    }

    async fn archive(&self, command: ArchiveCommand) -> Result<()> {
        let store = open_store(&self.config.storage).await;

        match command {
            ArchiveCommand::List { kind, path, search } => {
                let root = kind.storage_folder();
                let path = path.unwrap_or_else(|| root.to_string());
                let view = browse(store.as_ref(), root, &path, &search)
                    .await
                    .with_context(|| format!("Failed to list {path}"))?;

                println!("📁 {}", view.path);
                if let Some(parent) = &view.parent {
                    println!("   (parent: {parent})");
                }
                for folder in &view.folders {
                    println!("  {}/  {}", folder.name(), folder.readable_size());
                }
                for file in &view.files {
                    println!(
                        "  {}  {}",
                        file.name(),
                        unit_redactor::storage::human_size(file.size)
                    );
                }
                if view.folders.is_empty() && view.files.is_empty() {
                    println!("  (empty)");
                }
            }
            ArchiveCommand::Download {
                prefixes,
                files,
                output,
            } => {
                if prefixes.is_empty() && files.is_empty() {
                    anyhow::bail!("Nothing selected. Use --prefix or --file.");
                }
                let bytes = download_zip(store.as_ref(), &prefixes, &files)
                    .await
                    .context("Archive download failed")?;
                std::fs::write(&output, &bytes)
                    .with_context(|| format!("Failed to write to {}", output.display()))?;
                println!(
                    "✓ Downloaded {} → {}",
                    unit_redactor::storage::human_size(bytes.len() as u64),
                    output.display()
                );
            }
        }

        Ok(())
    }

    /// Dumps words and their boxes.
    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let pages = extract_pages(&bytes, &[]).with_context(|| "Text extraction failed")?;

        let mut text = String::new();
        for page in &pages {
            text.push_str(&format!(
                "--- Page {} ({:.1} x {:.1}) ---\n",
                page.index + 1,
                page.width,
                page.height
            ));
            for word in &page.words {
                text.push_str(&format!(
                    "{}\t{:.1}\t{:.1}\t{:.1}\t{:.1}\n",
                    word.text, word.rect.x0, word.rect.y0, word.rect.x1, word.rect.y1
                ));
            }
        }

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} page(s) → {}",
                pages.len(),
                output_path.display()
            );
        } else {
            print!("{text}");
        }

        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let handler = CommandHandler::new(config, cli.verbose);

    match cli.command {
        Commands::Process(args) => handler.process(args).await,
        Commands::Archive { command } => handler.archive(command).await,
        Commands::Extract { input, output } => handler.extract(&input, output.as_deref()),
    }
}
