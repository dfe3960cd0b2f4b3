use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use tag_scraper::engine::{self, ExtractionSpec, OutputFormat, RawOutput};
use tag_scraper::settings::Settings;
use tag_scraper::store::ScraperUpdate;
use tag_scraper::{ConfigStore, Document, HttpFetcher, MemoryStore, RawQuery, ScrapeService};

/// Extract labeled rows from HTML pages using tag-path selectors.
#[derive(Debug, Parser)]
#[command(name = "tagscrape", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to ./tagscrape.toml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a stored scraper in simple mode
    Scrape { scraper_id: u64 },
    /// Run ad-hoc selectors against a stored scraper's page
    Raw {
        scraper_id: u64,
        #[arg(long, default_value = "json")]
        output_format: String,
        #[command(flatten)]
        selection: Selection,
    },
    /// List every tag path of a stored scraper's page
    Tags {
        scraper_id: u64,
        #[arg(long)]
        trim: Option<String>,
    },
    /// Run any mode against a local HTML file
    File {
        path: PathBuf,
        #[arg(long, value_enum, default_value = "simple")]
        mode: FileMode,
        #[arg(long, default_value = "json")]
        output_format: String,
        #[command(flatten)]
        selection: Selection,
    },
    /// Manage scrapers
    Scraper {
        #[command(subcommand)]
        action: ScraperAction,
    },
    /// Show or change a scraper config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the row labels of a config
    Labels {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Manage the selectors of a config
    Selectors {
        #[command(subcommand)]
        action: ListAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FileMode {
    Simple,
    Raw,
    Census,
}

#[derive(Debug, Clone, Default, Args)]
struct Selection {
    /// Trim scope, e.g. '<div class="results">'
    #[arg(long)]
    trim: Option<String>,
    /// Selector, repeatable, e.g. '<table><tr><td>'
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Row label, repeatable
    #[arg(long = "label")]
    labels: Vec<String>,
    /// Fragments per row
    #[arg(long)]
    group: Option<i64>,
}

#[derive(Debug, Subcommand)]
enum ScraperAction {
    Add { name: String, url: String },
    List,
    Show { scraper_id: u64 },
    Update {
        scraper_id: u64,
        name: String,
        url: String,
        #[arg(long)]
        config: Option<u64>,
    },
    Rm { scraper_id: u64 },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Config with its labels and selectors
    Show { config_id: u64 },
    Set {
        config_id: u64,
        #[arg(long)]
        trim: Option<String>,
        #[arg(long)]
        group: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum ListAction {
    List { config_id: u64 },
    /// Replace all entries, keeping the given order
    Set { config_id: u64, values: Vec<String> },
    /// Append entries
    Add { config_id: u64, values: Vec<String> },
    Clear { config_id: u64 },
}

fn main() {
    if let Err(error) = run() {
        eprintln!("tagscrape error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;
    execute(cli)
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    // Offline runs need neither settings nor the store.
    if let Command::File { path, mode, output_format, selection } = &cli.command {
        let markup = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return run_file(&markup, *mode, output_format, selection);
    }

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load settings")?;

    let store = MemoryStore::open(&settings.store.path).with_context(|| {
        format!("failed to open store {}", settings.store.path.display())
    })?;
    let fetcher = HttpFetcher::new(&settings.fetch.user_agent, settings.fetch.timeout());
    let service = ScrapeService::new(fetcher, store);

    match cli.command {
        Command::Scrape { scraper_id } => print(&service.scrape(scraper_id)?),
        Command::Raw { scraper_id, output_format, selection } => {
            let query = RawQuery {
                output_format: Some(output_format),
                trim_tag: selection.trim,
                group_row_count: selection.group,
                tags: selection.tags,
                row_labels: selection.labels,
            };
            print_raw(service.raw(scraper_id, &query)?)
        }
        Command::Tags { scraper_id, trim } => {
            print(&json!({ "tags": service.raw_tags(scraper_id, trim.as_deref())? }))
        }
        Command::Scraper { action } => scraper_command(service.store(), action),
        Command::Config { action } => config_command(service.store(), action),
        Command::Labels { action } => labels_command(service.store(), action),
        Command::Selectors { action } => selectors_command(service.store(), action),
        Command::File { .. } => Ok(()),
    }
}

fn run_file(
    markup: &str,
    mode: FileMode,
    output_format: &str,
    selection: &Selection,
) -> anyhow::Result<()> {
    let document = Document::parse(markup);
    let spec = ExtractionSpec {
        trim: selection.trim.clone(),
        selectors: selection.tags.clone(),
        labels: selection.labels.clone(),
        group_width: selection.group,
    };
    match mode {
        FileMode::Simple => print(&json!({ "data": engine::extract(&document, &spec)? })),
        FileMode::Raw => {
            let format: OutputFormat = output_format.parse()?;
            print_raw(engine::extract_raw(&document, &spec, format)?)
        }
        FileMode::Census => {
            print(&json!({ "tags": engine::census(&document, spec.trim.as_deref())? }))
        }
    }
}

fn scraper_command(store: &MemoryStore, action: ScraperAction) -> anyhow::Result<()> {
    match action {
        ScraperAction::Add { name, url } => print(&store.create_scraper(&name, &url)?),
        ScraperAction::List => print(&store.list_scrapers()?),
        ScraperAction::Show { scraper_id } => print(&store.get_scraper(scraper_id)?),
        ScraperAction::Update { scraper_id, name, url, config } => {
            let update = ScraperUpdate {
                scraper_name: name,
                scraping_url: url,
                scraper_config_id: config,
            };
            print(&store.update_scraper(scraper_id, update)?)
        }
        ScraperAction::Rm { scraper_id } => {
            store.delete_scraper(scraper_id)?;
            print(&json!({ "message": "Scraper deleted" }))
        }
    }
}

fn config_command(store: &MemoryStore, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { config_id } => print(&json!({
            "config": store.get_config(config_id)?,
            "row_labels": store.list_row_labels(config_id)?,
            "tags": store.list_tags(config_id)?,
        })),
        ConfigAction::Set { config_id, trim, group } => {
            print(&store.update_config(config_id, trim, group)?)
        }
    }
}

fn labels_command(store: &MemoryStore, action: ListAction) -> anyhow::Result<()> {
    match action {
        ListAction::List { config_id } => print(&store.list_row_labels(config_id)?),
        ListAction::Set { config_id, values } => {
            let orders: Vec<i64> = (0..values.len() as i64).collect();
            print(&store.replace_row_labels(config_id, &orders, &values)?)
        }
        ListAction::Add { config_id, values } => {
            let next = store
                .list_row_labels(config_id)?
                .last()
                .map_or(0, |l| l.row_order + 1);
            let orders: Vec<i64> = (next..next + values.len() as i64).collect();
            print(&store.create_row_labels(config_id, &orders, &values)?)
        }
        ListAction::Clear { config_id } => {
            let removed = store.delete_row_labels(config_id)?;
            print(&json!({ "removed": removed }))
        }
    }
}

fn selectors_command(store: &MemoryStore, action: ListAction) -> anyhow::Result<()> {
    match action {
        ListAction::List { config_id } => print(&store.list_tags(config_id)?),
        ListAction::Set { config_id, values } => print(&store.replace_tags(config_id, &values)?),
        ListAction::Add { config_id, values } => print(&store.create_tags(config_id, &values)?),
        ListAction::Clear { config_id } => {
            let removed = store.delete_tags(config_id)?;
            print(&json!({ "removed": removed }))
        }
    }
}

fn print_raw(output: RawOutput) -> anyhow::Result<()> {
    match output {
        RawOutput::Html(markup) => {
            println!("{markup}");
            Ok(())
        }
        RawOutput::Records(data) => print(&json!({ "data": data })),
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TAGSCRAPE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
