//! Docver CLI - dv command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cli_lib::{cmd, logging, util, AppContext};
use journal::VersionFilter;
use std::path::PathBuf;

/// Docver - Point-in-time versions of your documents
#[derive(Parser)]
#[command(name = "dv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage root (default: store.root from config, else the config file's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: $DOCVER_CONFIG, else ./docver.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the version store directories
    Init,
    /// Save a new version of a document
    Snapshot {
        /// Document to snapshot
        file: PathBuf,
        /// Notes stored with the version
        #[arg(short = 'm', long)]
        notes: Option<String>,
    },
    /// List versions, newest first
    Log {
        /// Number of versions to show
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show version details
    Show {
        /// Version id (v003, 3) or "latest"
        version: String,
    },
    /// Compare a document with a stored version
    Diff {
        /// Live document
        file: PathBuf,
        /// Version id (v003, 3) or "latest"
        version: String,
    },
    /// Restore a document to a stored version
    Restore {
        /// Live document
        file: PathBuf,
        /// Version id (v003, 3) or "latest"
        version: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show store status
    Status,
    /// Check records against snapshot files
    Verify {
        /// Re-hash snapshot contents
        #[arg(long)]
        deep: bool,
    },
    /// Delete old versions
    Gc {
        /// Newest versions to keep (0 keeps all; default from config)
        #[arg(long)]
        keep: Option<usize>,
        /// Also delete orphaned snapshot files and dangling records
        #[arg(long)]
        orphans: bool,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args)]
struct FilterArgs {
    /// Only versions whose notes contain this text
    #[arg(long)]
    notes: Option<String>,
    /// Only versions created on or after (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    since: Option<String>,
    /// Only versions created on or before (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    until: Option<String>,
    /// Minimum snapshot size in bytes
    #[arg(long)]
    min_size: Option<u64>,
    /// Maximum snapshot size in bytes
    #[arg(long)]
    max_size: Option<u64>,
}

impl FilterArgs {
    fn into_filter(self) -> Result<VersionFilter> {
        Ok(VersionFilter {
            notes_contains: self.notes,
            since: self.since.as_deref().map(util::parse_date).transpose()?,
            until: self.until.as_deref().map(util::parse_date).transpose()?,
            min_size: self.min_size,
            max_size: self.max_size,
        })
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all values
    List,
    /// Print one value
    Get {
        /// Key, e.g. retention.max_versions
        key: String,
    },
    /// Set one value
    Set {
        key: String,
        value: String,
    },
    /// Print the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print a commented example config
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = AppContext::load(cli.root.as_deref(), cli.config.as_deref(), cli.json)?;

    // Initialize tracing; keep the guard so the log file is flushed on exit
    let _log_guard = logging::init(cli.verbose, &ctx.config.log, ctx.logs_dir().as_deref());
    tracing::debug!(
        config = %ctx.config_path.display(),
        root = %ctx.store.root.display(),
        "Resolved store"
    );

    match cli.command {
        Commands::Init => cmd::init::run(&ctx),
        Commands::Snapshot { file, notes } => cmd::snapshot::run(&ctx, &file, notes.as_deref()),
        Commands::Log { limit, filter } => cmd::log::run(&ctx, &filter.into_filter()?, limit),
        Commands::Show { version } => cmd::show::run(&ctx, &version),
        Commands::Diff { file, version } => cmd::diff::run(&ctx, &file, &version),
        Commands::Restore { file, version, yes } => cmd::restore::run(&ctx, &file, &version, yes),
        Commands::Status => cmd::status::run(&ctx),
        Commands::Verify { deep } => cmd::verify::run(&ctx, deep),
        Commands::Gc {
            keep,
            orphans,
            dry_run,
        } => cmd::gc::run(&ctx, keep, orphans, dry_run),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&ctx),
            ConfigCommands::Get { key } => cmd::config::run_get(&ctx, &key),
            ConfigCommands::Set { key, value } => cmd::config::run_set(&ctx, &key, &value),
            ConfigCommands::Path { create } => cmd::config::run_path(&ctx, create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
