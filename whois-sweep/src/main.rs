//! WHOIS Sweep CLI Application
//!
//! A command-line interface for batch WHOIS lookups with optional ASN and
//! IP address enrichment, built on whois-sweep-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use std::process;
use std::time::{Duration, Instant};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use whois_sweep_lib::{
    load_env_config, parse_domain_list, ConfigManager, Dispatcher, EnvConfig, OutputFormat,
    QueryOptions, QueryResult, ResultRow, SweepConfig,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-sweep
#[derive(Parser, Debug)]
#[command(name = "whois-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query WHOIS registration data for many domains at once")]
#[command(
    long_about = "Query WHOIS registration data for many domains at once.\n\nReports registrar, expiration and days left, with optional origin ASN and resolved IPv4/IPv6 addresses. Output as a table, JSON or CSV."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to query
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Domain to query (repeatable)
    #[arg(
        short = 'd',
        long = "domain",
        value_name = "DOMAIN",
        action = clap::ArgAction::Append,
        help_heading = "Domain Selection"
    )]
    pub domain: Vec<String>,

    /// Read domain list from file (one per line, # for comments)
    #[arg(
        short = 'f',
        long = "domainfile",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub domainfile: Option<String>,

    /// Show origin ASN of each domain's first IPv4 address
    #[arg(short = 'A', long = "asn", help_heading = "Enrichment")]
    pub asn: bool,

    /// Query and show IPv4 addresses
    #[arg(long = "t4", help_heading = "Enrichment")]
    pub ipv4: bool,

    /// Query and show IPv6 addresses
    #[arg(long = "t6", help_heading = "Enrichment")]
    pub ipv6: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", conflicts_with = "json", help_heading = "Output Format")]
    pub csv: bool,

    /// Number of concurrent workers (1-100)
    #[arg(
        short = 'w',
        long = "workers",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub workers: Option<usize>,

    /// Number of retries on failure
    #[arg(long = "retry", value_name = "N", help_heading = "Performance")]
    pub retry: Option<usize>,

    /// Delay between queries in milliseconds
    #[arg(long = "delay", value_name = "MS", help_heading = "Performance")]
    pub delay: Option<u64>,

    /// Use a specific config file
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose output with debug logging on stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(args.verbose);

    if let Err(e) = run_sweep(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug for `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.domain.is_empty() && args.domainfile.is_none() {
        return Err("Please provide domains with -d/--domain or --domainfile".to_string());
    }

    if let Some(workers) = args.workers {
        if workers == 0 || workers > 100 {
            return Err("Workers must be between 1 and 100".to_string());
        }
    }

    if args.json && args.csv {
        return Err("Cannot specify both --json and --csv".to_string());
    }

    Ok(())
}

async fn run_sweep(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let domains = get_domains_to_query(&args)?;
    let env_config = load_env_config();
    let (config, format) = build_config(&args, &env_config)?;

    debug!(
        domains = domains.len(),
        workers = config.workers,
        retries = config.max_retries,
        delay_ms = config.delay.as_millis() as u64,
        "Configuration resolved"
    );

    let options = config.options;
    let dispatcher = Dispatcher::new(config);
    let start_time = Instant::now();

    let mut progress = match format {
        OutputFormat::Table => ui::Progress::start(domains.len()),
        _ => None,
    };

    let mut results: Vec<QueryResult> = Vec::with_capacity(domains.len());
    let mut stream = dispatcher.stream(&domains);
    while let Some(result) = stream.next().await {
        if let Some(progress) = progress.as_mut() {
            progress.advance(result.domain());
        }
        results.push(result);
    }
    drop(stream);

    if let Some(progress) = progress {
        progress.finish();
    }

    let duration = start_time.elapsed();
    display_results(&results, format, &options, duration)?;

    Ok(())
}

/// Collect domains from positional arguments, `-d` flags and the domain file.
fn get_domains_to_query(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut domains: Vec<String> = args
        .domains
        .iter()
        .chain(args.domain.iter())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if let Some(file_path) = &args.domainfile {
        domains.extend(read_domains_from_file(file_path)?);
    }

    if domains.is_empty() {
        return Err("Please provide domains with -d/--domain or --domainfile".into());
    }

    Ok(domains)
}

fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file_path)
        .map_err(|e| format!("Unable to read file '{}': {}", file_path, e))?;

    let domains = parse_domain_list(&content);
    if domains.is_empty() {
        return Err(format!("No domains found in file '{}'", file_path).into());
    }

    Ok(domains)
}

/// Build the sweep configuration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (WSW_*)
/// 3. Config files (local, then home, then XDG)
/// 4. Built-in defaults
fn build_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<(SweepConfig, OutputFormat), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Config files
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?,
        None => config_manager.discover_and_load()?,
    };

    let mut config = file_config.apply_to(SweepConfig::default());
    let mut format = file_config.output_format().unwrap_or_default();

    // Step 2: Environment variables
    config = env_config.apply_to(config);
    if let Some(env_format) = env_config.format {
        format = env_format;
    }

    // Step 3: CLI arguments
    config = apply_cli_args_to_config(config, args);
    if args.json {
        format = OutputFormat::Json;
    } else if args.csv {
        format = OutputFormat::Csv;
    }

    Ok((config, format))
}

fn apply_cli_args_to_config(mut config: SweepConfig, args: &Args) -> SweepConfig {
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(retry) = args.retry {
        config = config.with_retries(retry);
    }
    if let Some(delay) = args.delay {
        config = config.with_delay(Duration::from_millis(delay));
    }
    // Enrichment flags can only switch features on
    if args.asn {
        config = config.with_asn(true);
    }
    if args.ipv4 {
        config = config.with_ipv4(true);
    }
    if args.ipv6 {
        config = config.with_ipv6(true);
    }
    config
}

/// Sort by domain and render in the requested format.
fn display_results(
    results: &[QueryResult],
    format: OutputFormat,
    options: &QueryOptions,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows: Vec<ResultRow> = results.iter().map(QueryResult::to_row).collect();
    rows.sort_by(|a, b| a.domain.cmp(&b.domain));

    match format {
        OutputFormat::Json => println!("{}", ui::render_json(&rows)?),
        OutputFormat::Csv => println!("{}", ui::render_csv(&rows, options)),
        OutputFormat::Table => {
            ui::print_table(&rows, options);
            if rows.len() > 1 {
                println!();
                let succeeded = results.iter().filter(|r| r.is_success()).count();
                ui::print_summary(rows.len(), succeeded, duration);
            }
        }
    }

    Ok(())
}
