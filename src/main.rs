use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atomizer::config::MigrateConfig;
use atomizer::errors::{MigrateError, Result};
use atomizer::migrator::Migrator;
use atomizer::types::{MigrationReport, SourceKind};

#[derive(Parser)]
#[command(
    name = "atomizer",
    version,
    about = "Migrate Notion, Roam, and Obsidian exports into an atomic-note corpus"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a Notion markdown export
    Notion {
        #[command(flatten)]
        args: MigrateArgs,
    },
    /// Migrate a Roam Research export (JSON or markdown)
    Roam {
        #[command(flatten)]
        args: MigrateArgs,

        /// Maximum outline depth preserved when flattening blocks
        #[arg(long, default_value_t = 2)]
        flatten_depth: usize,
    },
    /// Migrate an Obsidian vault
    Obsidian {
        #[command(flatten)]
        args: MigrateArgs,
    },
}

/// Options shared by every migration subcommand.
#[derive(Args)]
struct MigrateArgs {
    /// Path to the source export
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the corpus is written into
    #[arg(short, long)]
    output: PathBuf,

    /// Organization name used in the generated index
    #[arg(long)]
    org: String,

    /// Run the full pipeline without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Minimum word count for a note to be migrated
    #[arg(long)]
    min_words: Option<usize>,

    /// Keep daily/journal notes instead of skipping them
    #[arg(long)]
    keep_daily: bool,

    /// Tag added first to every migrated note
    #[arg(long)]
    tag_prefix: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(shared_args(&cli).verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn shared_args(cli: &Cli) -> &MigrateArgs {
    match &cli.command {
        Commands::Notion { args } => args,
        Commands::Roam { args, .. } => args,
        Commands::Obsidian { args } => args,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "atomizer=debug" } else { "atomizer=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let (kind, args, flatten_depth) = match cli.command {
        Commands::Notion { args } => (SourceKind::Notion, args, None),
        Commands::Roam {
            args,
            flatten_depth,
        } => (SourceKind::Roam, args, Some(flatten_depth)),
        Commands::Obsidian { args } => (SourceKind::Obsidian, args, None),
    };

    if args.org.trim().is_empty() {
        return Err(MigrateError::Config {
            message: "--org must not be empty".to_string(),
        });
    }

    let mut config = MigrateConfig::for_source(kind);
    config.org_name = args.org.clone();
    config.dry_run = args.dry_run;
    if let Some(min_words) = args.min_words {
        config.filter.min_word_count = min_words;
    }
    if args.keep_daily {
        config.filter.exclude_date_like = false;
    }
    if let Some(prefix) = args.tag_prefix {
        config.tag_prefix = prefix;
    }
    if let Some(depth) = flatten_depth {
        config.flatten_depth = depth;
    }

    let migrator = Migrator::new(kind, &args.input, &args.output, config)?;
    let report = migrator.run()?;
    print_summary(kind, &report, args.dry_run);

    if report.failed() {
        process::exit(1);
    }
    Ok(())
}

fn print_summary(kind: SourceKind, report: &MigrationReport, dry_run: bool) {
    let stats = &report.stats;
    let rule = "=".repeat(50);

    println!("\n{}", rule);
    println!("{} MIGRATION SUMMARY", kind.as_str().to_uppercase());
    println!("{}", rule);
    println!("  Units scanned:         {}", stats.total_scanned);
    println!("  Successfully migrated: {}", stats.migrated);
    println!("  Skipped:               {}", stats.skipped);
    println!("  Errors:                {}", stats.errors);
    println!("  Links resolved:        {}", stats.links_resolved);
    println!("  Links unresolved:      {}", stats.links_unresolved);
    if stats.blocks_processed > 0 {
        println!("  Blocks processed:      {}", stats.blocks_processed);
        println!("  Block refs resolved:   {}", stats.block_refs_resolved);
    }
    if stats.key_collisions > 0 {
        println!("  Key collisions:        {}", stats.key_collisions);
    }
    if stats.assets_copied > 0 {
        println!("  Assets copied:         {}", stats.assets_copied);
    }
    println!("  Completed in {}ms", report.duration_ms);
    println!("{}", rule);

    if dry_run {
        println!("\n[DRY RUN - no files were written]");
    }
}
