//! `foodlink` - CLI for food donation tracking
//!
//! This binary provides the command-line interface for importing donation
//! data, running the analyses and editing individual rows.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use foodlink::cli::{
    render, ClaimCommand, Cli, Command, ConfigCommand, FiltersCommand, ImportCommand,
    ListingCommand, ListingsCommand, OutputFormat, ProviderCommand, ReceiverCommand,
    ReportCommand, StatusCommand,
};
use foodlink::import::{self, ImportOutcome, ImportReport};
use foodlink::model::{Claim, FoodListing, Provider, Receiver};
use foodlink::queries::{catalog, provider_contacts_in_view, Analysis, ListingView, ReportParams};
use foodlink::storage::migrations::CURRENT_VERSION;
use foodlink::storage::{Record, Repository};
use foodlink::{init_logging, Config, Error, ResultSet, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database.path = Some(database);
    }

    let command = cli.command;
    if let Command::Config(config_cmd) = command {
        return handle_config(&config, cli.config, config_cmd);
    }

    let storage = open_storage(&config, !matches!(command, Command::Import(_)))?;

    // Execute the command
    match command {
        Command::Init => handle_init(&storage),
        Command::Import(import_cmd) => handle_import(&storage, &config, import_cmd),
        Command::Status(status_cmd) => handle_status(&storage, &status_cmd),
        Command::Filters(filters_cmd) => handle_filters(&storage, &filters_cmd),
        Command::Listings(listings_cmd) => handle_listings(&storage, &listings_cmd),
        Command::Report(report_cmd) => handle_report(&storage, &config, report_cmd),
        Command::Provider(cmd) => handle_provider(&storage, cmd),
        Command::Receiver(cmd) => handle_receiver(&storage, cmd),
        Command::Listing(cmd) => handle_listing(&storage, cmd),
        Command::Claim(cmd) => handle_claim(&storage, cmd),
        Command::Config(_) => Ok(()),
    }
}

/// Open the configured database, importing CSVs into empty tables when
/// `import.load_on_open` is set and a data directory is configured.
fn open_storage(config: &Config, auto_import: bool) -> Result<Storage> {
    let path = config.database_path();
    let storage = Storage::open(&path, config.database.delete_policy)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    if auto_import && config.import.load_on_open {
        if let Some(files) = config.import.files() {
            debug!("Importing on open from {}", files.providers.display());
            import::load_all(&storage, &files).context("failed to import CSV files")?;
        }
    }

    Ok(storage)
}

fn print_result(result: &ResultSet, format: OutputFormat) -> Result<()> {
    print!("{}", render(result, format)?);
    Ok(())
}

fn print_records<R: Record + Serialize>(
    title: &str,
    records: &[R],
    format: OutputFormat,
) -> Result<()> {
    print_result(&ResultSet::from_rows(title, R::COLUMNS, records)?, format)
}

fn fetch<R: Record>(repository: &Repository<'_, R>, id: i64) -> Result<R> {
    repository
        .get(id)?
        .ok_or_else(|| Error::not_found(R::ENTITY, id).into())
}

fn ensure_found<R: Record>(found: bool, id: i64) -> Result<()> {
    if found {
        Ok(())
    } else {
        Err(Error::not_found(R::ENTITY, id).into())
    }
}

fn handle_init(storage: &Storage) -> Result<()> {
    println!("Database ready: {}", storage.path().display());
    println!("  Schema version: {CURRENT_VERSION}");
    println!("  Delete policy:  {}", storage.delete_policy());
    Ok(())
}

fn print_import_report(report: &ImportReport) {
    for table in &report.tables {
        match &table.outcome {
            ImportOutcome::Loaded(rows) => println!("{:<14} loaded {rows} rows", table.table),
            ImportOutcome::SkippedNotEmpty(rows) => {
                println!("{:<14} skipped ({rows} rows already present)", table.table);
            }
            ImportOutcome::MissingFile(path) => {
                println!("{:<14} missing file {}", table.table, path.display());
            }
        }
    }
}

fn handle_import(storage: &Storage, config: &Config, cmd: ImportCommand) -> Result<()> {
    let Some(data_dir) = cmd.data_dir.or_else(|| config.import.data_dir.clone()) else {
        bail!("no data directory: pass --data-dir or set import.data_dir");
    };

    info!("Importing CSV files from {}", data_dir.display());
    let files = config.import.files_in(&data_dir);
    let report = import::load_all(storage, &files)
        .with_context(|| format!("failed to import from {}", data_dir.display()))?;

    print_import_report(&report);
    println!("Total rows loaded: {}", report.total_loaded());
    Ok(())
}

fn handle_status(storage: &Storage, cmd: &StatusCommand) -> Result<()> {
    let stats = storage.stats()?;
    if cmd.json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "schema_version": CURRENT_VERSION,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("foodlink status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Delete policy: {}", stats.delete_policy);
        println!();
        println!("Providers:     {}", stats.providers);
        println!("Receivers:     {}", stats.receivers);
        println!("Food listings: {}", stats.food_listings);
        println!("Claims:        {}", stats.claims);
    }
    Ok(())
}

fn handle_filters(storage: &Storage, cmd: &FiltersCommand) -> Result<()> {
    let options = storage.analytics().filter_options()?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        println!("Cities:     {}", options.cities.join(", "));
        println!("Providers:  {}", options.providers.join(", "));
        println!("Food types: {}", options.food_types.join(", "));
        println!("Meal types: {}", options.meal_types.join(", "));
    }
    Ok(())
}

fn handle_listings(storage: &Storage, cmd: &ListingsCommand) -> Result<()> {
    let views = storage.analytics().filtered_listings(&cmd.filter())?;
    let result = if cmd.contacts {
        ResultSet::from_rows(
            "Provider contacts",
            &["name", "contact"],
            &provider_contacts_in_view(&views),
        )?
    } else {
        ResultSet::from_rows("Food listings", ListingView::COLUMNS, &views)?
    };
    print_result(&result, cmd.format)
}

fn handle_report(storage: &Storage, config: &Config, cmd: ReportCommand) -> Result<()> {
    if cmd.list {
        for analysis in Analysis::ALL {
            let mut notes = Vec::new();
            if analysis.needs_city() {
                notes.push("--city");
            }
            if analysis.uses_as_of() {
                notes.push("--as-of");
            }
            if analysis.uses_limit() {
                notes.push("--limit");
            }
            println!(
                "{:<26} {}{}",
                analysis.name(),
                analysis.title(),
                if notes.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", notes.join(" "))
                }
            );
        }
        return Ok(());
    }

    let Some(name) = cmd.name else {
        bail!("an analysis name is required (see --list)");
    };
    let analysis: Analysis = name.parse()?;
    let params = ReportParams {
        city: cmd.city,
        as_of: cmd.as_of.unwrap_or_else(|| Local::now().date_naive()),
        limit: cmd.limit.unwrap_or(config.report.top_limit),
    };

    let result = catalog::run(storage.connection(), analysis, &params)
        .with_context(|| format!("analysis '{analysis}' failed"))?;
    print_result(&result, cmd.format)
}

fn handle_provider(storage: &Storage, cmd: ProviderCommand) -> Result<()> {
    let providers = storage.providers();
    match cmd {
        ProviderCommand::Add(args) => {
            let provider = Provider::from(args);
            providers
                .insert(&provider)
                .with_context(|| format!("failed to add provider {}", provider.provider_id))?;
            println!("Added provider {}", provider.provider_id);
        }
        ProviderCommand::Save(args) => {
            let provider = Provider::from(args);
            providers
                .save(&provider)
                .with_context(|| format!("failed to save provider {}", provider.provider_id))?;
            println!("Saved provider {}", provider.provider_id);
        }
        ProviderCommand::Get { id, format } => {
            print_records("Provider", &[fetch(&providers, id)?], format)?;
        }
        ProviderCommand::List { city, format } => {
            let list = match city {
                Some(city) => providers.list_by_city(&city)?,
                None => providers.list()?,
            };
            print_records("Providers", &list, format)?;
        }
        ProviderCommand::SetCity { id, city } => {
            ensure_found::<Provider>(providers.update_city(id, &city)?, id)?;
            println!("Provider {id} moved to {city}");
        }
        ProviderCommand::Delete { id } => {
            let deleted = providers
                .delete(id)
                .with_context(|| format!("failed to delete provider {id}"))?;
            ensure_found::<Provider>(deleted, id)?;
            println!("Deleted provider {id}");
        }
    }
    Ok(())
}

fn handle_receiver(storage: &Storage, cmd: ReceiverCommand) -> Result<()> {
    let receivers = storage.receivers();
    match cmd {
        ReceiverCommand::Add(args) => {
            let receiver = Receiver::from(args);
            receivers
                .insert(&receiver)
                .with_context(|| format!("failed to add receiver {}", receiver.receiver_id))?;
            println!("Added receiver {}", receiver.receiver_id);
        }
        ReceiverCommand::Save(args) => {
            let receiver = Receiver::from(args);
            receivers
                .save(&receiver)
                .with_context(|| format!("failed to save receiver {}", receiver.receiver_id))?;
            println!("Saved receiver {}", receiver.receiver_id);
        }
        ReceiverCommand::Get { id, format } => {
            print_records("Receiver", &[fetch(&receivers, id)?], format)?;
        }
        ReceiverCommand::List { format } => {
            print_records("Receivers", &receivers.list()?, format)?;
        }
        ReceiverCommand::SetCity { id, city } => {
            ensure_found::<Receiver>(receivers.update_city(id, &city)?, id)?;
            println!("Receiver {id} moved to {city}");
        }
        ReceiverCommand::Delete { id } => {
            let deleted = receivers
                .delete(id)
                .with_context(|| format!("failed to delete receiver {id}"))?;
            ensure_found::<Receiver>(deleted, id)?;
            println!("Deleted receiver {id}");
        }
    }
    Ok(())
}

fn handle_listing(storage: &Storage, cmd: ListingCommand) -> Result<()> {
    let listings = storage.listings();
    match cmd {
        ListingCommand::Add(args) => {
            let listing = FoodListing::from(args);
            listings
                .insert(&listing)
                .with_context(|| format!("failed to add food listing {}", listing.food_id))?;
            println!("Added food listing {}", listing.food_id);
        }
        ListingCommand::Save(args) => {
            let listing = FoodListing::from(args);
            listings
                .save(&listing)
                .with_context(|| format!("failed to save food listing {}", listing.food_id))?;
            println!("Saved food listing {}", listing.food_id);
        }
        ListingCommand::Get { id, format } => {
            print_records("Food listing", &[fetch(&listings, id)?], format)?;
        }
        ListingCommand::List { format } => {
            print_records("Food listings", &listings.list()?, format)?;
        }
        ListingCommand::SetQuantity { id, quantity } => {
            ensure_found::<FoodListing>(listings.update_quantity(id, quantity)?, id)?;
            println!("Food listing {id} quantity set to {quantity}");
        }
        ListingCommand::Delete { id } => {
            let deleted = listings
                .delete(id)
                .with_context(|| format!("failed to delete food listing {id}"))?;
            ensure_found::<FoodListing>(deleted, id)?;
            println!("Deleted food listing {id}");
        }
    }
    Ok(())
}

fn handle_claim(storage: &Storage, cmd: ClaimCommand) -> Result<()> {
    let claims = storage.claims();
    let now = Local::now().naive_local();
    match cmd {
        ClaimCommand::Add(args) => {
            let claim = args.into_claim(now);
            claims
                .insert(&claim)
                .with_context(|| format!("failed to add claim {}", claim.claim_id))?;
            println!("Added claim {}", claim.claim_id);
        }
        ClaimCommand::Save(args) => {
            let claim = args.into_claim(now);
            claims
                .save(&claim)
                .with_context(|| format!("failed to save claim {}", claim.claim_id))?;
            println!("Saved claim {}", claim.claim_id);
        }
        ClaimCommand::Get { id, format } => {
            print_records("Claim", &[fetch(&claims, id)?], format)?;
        }
        ClaimCommand::List { format } => {
            print_records("Claims", &claims.list()?, format)?;
        }
        ClaimCommand::SetStatus { id, status } => {
            let status = status.into();
            ensure_found::<Claim>(claims.update_status(id, status)?, id)?;
            println!("Claim {id} is now {status}");
        }
        ClaimCommand::Delete { id } => {
            let deleted = claims
                .delete(id)
                .with_context(|| format!("failed to delete claim {id}"))?;
            ensure_found::<Claim>(deleted, id)?;
            println!("Deleted claim {id}");
        }
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    config_path: Option<PathBuf>,
    cmd: ConfigCommand,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Database]");
                println!("  Path:          {}", config.database_path().display());
                println!("  Delete policy: {}", config.database.delete_policy);
                println!();
                println!("[Import]");
                match &config.import.data_dir {
                    Some(dir) => println!("  Data dir:      {}", dir.display()),
                    None => println!("  Data dir:      (not set)"),
                }
                println!("  Load on open:  {}", config.import.load_on_open);
                println!("  Providers:     {}", config.import.providers_file);
                println!("  Receivers:     {}", config.import.receivers_file);
                println!("  Food listings: {}", config.import.food_listings_file);
                println!("  Claims:        {}", config.import.claims_file);
                println!("  Delimiter:     '{}'", config.import.delimiter);
                println!();
                println!("[Report]");
                println!("  Top limit:     {}", config.report.top_limit);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
