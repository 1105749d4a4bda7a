//! OrderDash - order analytics dashboard
//!
//! A CLI tool that loads an e-commerce order export, computes KPI
//! summaries, trends, distributions and top-N rankings, and writes
//! them as a Markdown or JSON dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, config, dataset unavailable, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use analysis::{build_dashboard, CategoryFilter, DashboardSettings, DateRange, Filters};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::ReportMetadata;
use source::{DataSource, DatasetCache, LoaderOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("OrderDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .orderdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the data source, top-N size, deltas, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the dataset and render every selected page. Returns the exit code.
async fn run_dashboard(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let source = resolve_source(&config);
    let options = LoaderOptions {
        timeout_seconds: config.source.timeout_seconds,
        show_progress: !args.quiet,
    };

    // Step 1: Load the dataset (a failure here aborts the whole render)
    println!("📥 Loading dataset: {}", source);
    let mut cache = DatasetCache::new();
    let table = cache
        .get_or_load(&source, &options)
        .await
        .with_context(|| format!("Dataset source unavailable: {}", source))?;
    let rows_loaded = table.row_count();

    if args.list_categories {
        return handle_list_categories(&table);
    }

    // Step 2: Build the filters and settings shared by every page
    let filters = Filters {
        category: CategoryFilter::from_selection(args.category.as_deref()),
        period: DateRange::new(args.from, args.to),
    };
    let settings = DashboardSettings::from(&config.dashboard);
    info!("Filters: {}", filters.describe());

    // Step 3: Render each selected page from the cached table
    println!("🔬 Computing dashboard...");
    let mut pages = Vec::with_capacity(args.menu.len());
    for menu in &args.menu {
        let table = cache.get_or_load(&source, &options).await?;
        pages.push(build_dashboard(&table, *menu, &filters, &settings));
    }

    // Step 4: Generate and save the report
    let metadata = ReportMetadata {
        source: source.to_string(),
        generated_at: Utc::now(),
        rows_loaded,
        filters: filters.describe(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&pages, &metadata)?,
        OutputFormat::Markdown => report::generate_markdown_report(&pages, &metadata),
    };

    let output_path = PathBuf::from(&config.report.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Dashboard Summary:");
    println!("   Rows loaded: {}", rows_loaded);
    for page in &pages {
        println!("   {} {}", page.menu.emoji(), page.menu);
        if let Some(ref notice) = page.notice {
            println!("      {}", notice);
            continue;
        }
        for kpi in &page.kpis {
            println!("      {}: {}", kpi.label, kpi.value);
        }
        println!(
            "      Panels: {} over {} rows",
            page.panels.len(),
            page.rows_analyzed
        );
    }
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Handle --list-categories: print the category selector entries, exit.
fn handle_list_categories(table: &models::Table) -> Result<i32> {
    let availability = analysis::probe(table);
    let view = analysis::TableView::all(table);
    let options = analysis::category_options(&view, &availability);

    if !availability.contains(analysis::Column::Category) {
        warn!("Dataset has no 'category' column");
    }

    println!("\n🏷️  Categories:");
    for option in options {
        println!("   {}", option);
    }
    Ok(0)
}

/// Pick the dataset source: a local file wins over a URL.
fn resolve_source(config: &Config) -> DataSource {
    match config.source.file {
        Some(ref file) => DataSource::File(PathBuf::from(file)),
        None => DataSource::Url(config.source.url.clone()),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
