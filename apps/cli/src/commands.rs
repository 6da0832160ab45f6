//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use folio_core::{
    IngestionPipeline, ProgressReporter, backfill_missing_slugs, get_by_slug, list_all, render_item,
};
use folio_shared::{
    AppConfig, IngestOptions, Item, ListQuery, SortDirection, SortField, SourceConfig,
    database_path, init_config, load_config,
};
use folio_source::NotionClient;
use folio_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Folio: publish Notion pages as MathJax-ready HTML items.
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Ingest Notion pages into a local store of MathJax-ready HTML items.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Database file (overrides FOLIO_DB_PATH and the config file).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a Notion page, render it and store it as a new item.
    Ingest {
        /// Page id or Notion URL.
        page: String,

        /// Author name (defaults to the configured author).
        #[arg(short, long)]
        author: Option<String>,

        /// Category tag.
        #[arg(short, long)]
        subject: Option<String>,

        /// Include the item in the index.
        #[arg(long)]
        indexed: bool,
    },

    /// List stored items as JSON.
    List {
        /// Order by: date, title or subject.
        #[arg(long, default_value = "date")]
        order_by: SortField,

        /// Direction: asc or desc.
        #[arg(long, default_value = "desc")]
        order: SortDirection,

        /// Only items with this subject.
        #[arg(long)]
        subject: Option<String>,

        /// Earliest date (inclusive, ISO-8601 prefix).
        #[arg(long)]
        start: Option<String>,

        /// Latest date (inclusive, ISO-8601 prefix).
        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },

    /// Render a stored item.
    Show {
        slug: String,

        /// Print the stored content without template rendering.
        #[arg(long)]
        raw: bool,
    },

    /// Assign slugs to stored items that have none.
    Backfill,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "folio=info",
        1 => "folio=debug",
        _ => "folio=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db.as_deref();
    match cli.command {
        Command::Ingest {
            page,
            author,
            subject,
            indexed,
        } => cmd_ingest(db, &page, author, subject, indexed).await,
        Command::List {
            order_by,
            order,
            subject,
            start,
            end,
            limit,
            offset,
        } => {
            let query = ListQuery {
                order_by,
                direction: order,
                subject,
                date_start: start,
                date_end: end,
                limit,
                offset,
            };
            cmd_list(db, &query).await
        }
        Command::Show { slug, raw } => cmd_show(db, &slug, raw).await,
        Command::Backfill => cmd_backfill(db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(db).await,
        },
    }
}

/// Open the store, creating and migrating it if needed.
async fn open_store(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => database_path(config)?,
    };
    Storage::open(&path)
        .await
        .wrap_err_with(|| format!("cannot open database at {}", path.display()))
}

/// [`open_store`], then fill in slugs for legacy items.
async fn open_storage(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let storage = open_store(db, config).await?;
    let filled = backfill_missing_slugs(&storage).await?;
    if filled > 0 {
        info!(filled, "assigned slugs to legacy items");
    }
    Ok(storage)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest(
    db: Option<&Path>,
    page: &str,
    author: Option<String>,
    subject: Option<String>,
    indexed: bool,
) -> Result<()> {
    let config = load_config()?;
    let source = NotionClient::new(&SourceConfig::from_app_config(&config)?)?;
    let storage = open_storage(db, &config).await?;

    let pipeline = IngestionPipeline::new(Arc::new(source), Arc::new(storage))
        .with_slug_retry_limit(config.defaults.slug_retry_limit);

    let options = IngestOptions {
        indexed,
        author: author.unwrap_or_else(|| config.defaults.author.clone()),
        subject,
    };

    info!(page, "ingesting page");
    let reporter = CliProgress::new();

    let item = match pipeline.ingest_with_progress(page, &options, &reporter).await {
        Ok(item) => item,
        Err(e) => {
            reporter.fail();
            let retryable = e.is_retryable();
            let result = Err(e);
            return if retryable {
                result.wrap_err(
                    "could not ingest the page; check the id and that the integration can \
                     access it, then try again",
                )
            } else {
                result.wrap_err("ingest failed")
            };
        }
    };

    println!();
    println!("  Item stored successfully!");
    println!("  Title:  {}", item.title);
    println!("  Slug:   {}", item.slug);
    println!("  ID:     {}", item.id);
    println!();

    Ok(())
}

async fn cmd_list(db: Option<&Path>, query: &ListQuery) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;
    let items = list_all(&storage, query).await?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

async fn cmd_show(db: Option<&Path>, slug: &str, raw: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;
    let item = get_by_slug(&storage, slug).await?;

    if raw {
        println!("{}", item.content);
    } else {
        println!("{}", render_item(&item)?);
    }
    Ok(())
}

async fn cmd_backfill(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_store(db, &config).await?;
    let filled = backfill_missing_slugs(&storage).await?;
    let total = storage.count_items().await?;
    println!("Assigned {filled} slug(s); {total} item(s) stored.");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(db: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    let resolved = match db {
        Some(path) => path.to_path_buf(),
        None => database_path(&config)?,
    };
    println!("# resolved database: {}", resolved.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn fail(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _item: &Item) {
        self.spinner.finish_and_clear();
    }
}
