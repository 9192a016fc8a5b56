mod cli;

use clap::Parser;
use cli::{Cli, Commands, KeyAction};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use imei_resolver::{
    config::Config,
    error::{self, ImeiError},
    export::{self, ExportFormat},
    imei::{self, Identifier},
    lookup::{DeviceRecord, HttpTransport, LookupCache},
    resolve::{BatchOrchestrator, BatchResult, DeviceResolver, Outcome},
    storage::Database,
    utils,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "imei_resolver=debug,info"
    } else {
        "imei_resolver=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Lookup {
            imeis,
            file,
            api_key,
            export,
            format,
            concurrency,
            output,
        } => {
            let options = LookupOptions {
                file,
                api_key,
                export,
                format,
                concurrency,
                output,
            };
            run_lookup(&config, imeis, options).await
        }

        Commands::CheckDigit { base } => check_digit(&base),

        Commands::Validate { imei } => validate(&imei),

        Commands::Key { action } => manage_key(&config, action),

        Commands::History { limit, format, export } => show_history(&config, limit, &format, export),

        Commands::Stats { format } => show_stats(&config, &format),

        Commands::Init => initialize(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

struct LookupOptions {
    file: Option<PathBuf>,
    api_key: Option<String>,
    export: Option<PathBuf>,
    format: Option<String>,
    concurrency: Option<usize>,
    output: String,
}

async fn run_lookup(config: &Config, mut identifiers: Vec<String>, options: LookupOptions) -> error::Result<()> {
    if let Some(path) = &options.file {
        identifiers.extend(utils::read_identifier_lines(path)?);
    } else if identifiers.is_empty() {
        identifiers = utils::read_identifier_lines(Path::new("-"))?;
    }

    if identifiers.iter().all(|line| line.trim().is_empty()) {
        return Err(ImeiError::NoInput);
    }

    let db = Database::new(&config.database.path)?;

    // A key given on the command line replaces the stored one
    let api_key = match options.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            db.save_api_key(key)?;
            key.to_string()
        }
        _ => db.load_api_key()?.ok_or(ImeiError::MissingApiKey)?,
    };

    let transport = HttpTransport::new(&config.service.api_url, config.request_timeout())?;
    let cache = Arc::new(LookupCache::new());
    let resolver = DeviceResolver::new(Arc::new(transport), Arc::clone(&cache), config.request_timeout())
        .with_strategy(config.batch.completion);

    let concurrency = options.concurrency.unwrap_or(config.batch.concurrency);
    let orchestrator = BatchOrchestrator::new(Arc::new(resolver), concurrency);

    let bar = ProgressBar::new(identifiers.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} IMEIs")
            .map_err(|e| ImeiError::Other(e.into()))?
            .progress_chars("=> "),
    );

    info!("Looking up {} lines", identifiers.len());
    let result = orchestrator.run_batch(&identifiers, &api_key, &bar).await;
    bar.finish_and_clear();
    info!(
        "Lookup cache: {} entries, {} hits, {} misses",
        cache.len(),
        cache.hits(),
        cache.misses()
    );

    if result.is_empty() {
        println!("{}", "No IMEIs to process".yellow());
        return Ok(());
    }

    if options.output == "json" {
        println!("{}", serde_json::to_string_pretty(&result.entries)?);
    } else {
        print_results(&result);
    }

    let records = result.records();
    for record in &records {
        db.save_lookup(record)?;
    }

    if records.is_empty() {
        println!("\n{}", "No results found.".yellow());
    } else if let Some(path) = &options.export {
        let format = resolve_export_format(config, path, options.format.as_deref())?;
        let written = export::export_to_file(path, &records, format)?;
        println!("{}", format!("✓ Exported {} devices to {}", written, path.display()).green());
    }

    result.print_summary();
    Ok(())
}

fn print_results(result: &BatchResult) {
    println!("\n{}", "=== Lookup Results ===".cyan().bold());
    utils::print_table_border(100);
    utils::print_table_row(&["Input", "IMEI", "Brand", "Model", "Status"], &[16, 20, 16, 24, 16]);
    utils::print_table_border(100);

    for entry in &result.entries {
        match &entry.outcome {
            Outcome::Success(record) => utils::print_table_row(
                &[
                    &entry.input,
                    &utils::format_imei(record),
                    record.brand_or_unknown(),
                    record.model_or_unknown(),
                    &"resolved".green().to_string(),
                ],
                &[16, 20, 16, 24, 16],
            ),
            failure => {
                println!(
                    "{:<16}  {}",
                    entry.input,
                    failure.describe().red()
                );
            }
        }
    }
    utils::print_table_border(100);
}

fn resolve_export_format(config: &Config, path: &Path, requested: Option<&str>) -> error::Result<ExportFormat> {
    match requested {
        Some(format) => format.parse(),
        None => match ExportFormat::from_path(path) {
            Some(format) => Ok(format),
            None => config.export.default_format.parse(),
        },
    }
}

fn check_digit(base: &str) -> error::Result<()> {
    let base = base.trim();
    let digit = imei::compute_check_digit(base)?;
    println!("Check digit: {}", digit.to_string().green().bold());
    println!("Full IMEI:   {}{}", base, digit);
    Ok(())
}

fn validate(raw: &str) -> error::Result<()> {
    let raw = raw.trim();
    match Identifier::parse(raw) {
        Ok(Identifier::Full(full)) if imei::is_valid_imei(&full) => {
            println!("{} {}", full, "valid ✓".green());
        }
        Ok(Identifier::Full(full)) => {
            let expected = imei::compute_check_digit(&full[..imei::BASE_LEN])?;
            println!(
                "{} {} (expected check digit {})",
                full,
                "invalid check digit ✗".red(),
                expected
            );
        }
        Ok(Identifier::Base(base)) => {
            let digit = imei::compute_check_digit(&base)?;
            println!(
                "{} is a 14-digit base; the Luhn-complete IMEI is {}{}",
                base, base, digit
            );
        }
        Err(e) => println!("{} {}", raw, format!("invalid: {}", e).red()),
    }
    Ok(())
}

fn manage_key(config: &Config, action: KeyAction) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;

    match action {
        KeyAction::Set { key } => {
            let key = key.trim();
            if key.is_empty() {
                return Err(ImeiError::MissingApiKey);
            }
            db.save_api_key(key)?;
            println!("{}", "✓ API key saved".green());
        }
        KeyAction::Show => match db.load_api_key()? {
            Some(key) => println!("API key: {}", utils::mask_key(&key)),
            None => println!("{}", "No API key stored".yellow()),
        },
        KeyAction::Clear { yes } => {
            if !yes && !utils::confirm_action("Remove the stored API key?")? {
                println!("Cancelled");
                return Ok(());
            }
            if db.clear_api_key()? {
                println!("{}", "✓ API key removed".green());
            } else {
                println!("{}", "No API key stored".yellow());
            }
        }
    }
    Ok(())
}

fn show_history(config: &Config, limit: usize, format: &str, export_path: Option<PathBuf>) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let history = db.get_history(Some(limit))?;

    if let Some(path) = export_path {
        let records: Vec<DeviceRecord> = history.iter().map(|h| h.to_device_record()).collect();
        let format = resolve_export_format(config, &path, None)?;
        let written = export::export_to_file(&path, &records, format)?;
        println!("{}", format!("✓ Exported {} devices to {}", written, path.display()).green());
        return Ok(());
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("{}", "No lookups recorded yet".yellow());
        return Ok(());
    }

    println!("{}", "Recent Lookups:".yellow());
    utils::print_table_border(90);
    utils::print_table_row(&["Timestamp", "IMEI", "Brand", "Model"], &[24, 17, 18, 24]);
    utils::print_table_border(90);
    for entry in &history {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&entry.looked_up_at),
                &entry.imei,
                entry.brand.as_deref().unwrap_or("unknown"),
                entry.model.as_deref().unwrap_or("unknown"),
            ],
            &[24, 17, 18, 24],
        );
    }
    utils::print_table_border(90);
    Ok(())
}

fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database.path)?;
    let stats = db.get_stats()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== IMEI Lookup Statistics ===".cyan().bold());
    println!("  Lookups:          {}", stats.total_lookups);
    println!("  Distinct devices: {}", stats.distinct_devices.to_string().green());
    println!("  Distinct brands:  {}", stats.distinct_brands.to_string().cyan());
    if let Some(last) = &stats.last_lookup {
        println!("  Last lookup:      {}", utils::format_timestamp(last));
    }
    Ok(())
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing IMEI resolver...".green());
    let db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Service URL:    {}", config.service.api_url);
    println!("  Timeout:        {}s", config.service.timeout_secs);
    println!("  Concurrency:    {}", config.batch.concurrency);
    println!("  Completion:     {:?}", config.batch.completion);
    println!("  Database:       {}", config.database.path);
    println!(
        "  API key:        {}",
        db.load_api_key()?
            .map(|k| utils::mask_key(&k))
            .unwrap_or_else(|| "not set".to_string())
    );

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to store your API key", "imei-resolver key set <KEY>".yellow());
    println!("  {} to resolve IMEIs", "imei-resolver lookup 49015420323751".yellow());
    Ok(())
}
