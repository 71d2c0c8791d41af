use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ftprov::config::Config;
use ftprov::fivetran::{FivetranClient, ProviderConfig};
use ftprov::gcp::auth::TokenSource;
use ftprov::gcp::client::GcpClient;
use ftprov::http::{format_api_error, HttpClient};
use ftprov::resource::{Provisioner, ResourceKind, ResourceRequest, Target};
use ftprov::secrets::{FileSecretStore, SecretManagerStore, SecretStore};
use ftprov::sink::FileSink;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Provision Fivetran groups, connectors and destinations
#[derive(Parser, Debug)]
#[command(name = "ftprov", version, about, long_about = None)]
struct Args {
    /// What to create
    #[arg(short, long, value_enum)]
    target: Target,

    /// Group to create, or the parent group of connectors/destinations
    #[arg(short, long)]
    group_name: String,

    /// Service type; with `--target all` the first is the connector's, the second the destination's
    #[arg(short, long = "service")]
    services: Vec<String>,

    /// Configuration secret ids, in the same order as `--service`
    #[arg(short, long = "configs")]
    configs: Vec<String>,

    /// Secret folded into the destination configuration
    #[arg(long)]
    destination_secret: Option<String>,

    /// File receiving successful responses
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GCP project holding the secrets
    #[arg(short, long)]
    project: Option<String>,

    /// Secret with the Fivetran API settings
    #[arg(long)]
    global_secret: Option<String>,

    /// Read secrets from a local YAML/JSON file instead of Secret Manager
    #[arg(long, conflicts_with_all = ["project", "access_token"])]
    secrets_file: Option<PathBuf>,

    /// GCP access token (defaults to GOOGLE_OAUTH_ACCESS_TOKEN, then ADC)
    #[arg(long)]
    access_token: Option<String>,

    /// Page cap for name lookups
    #[arg(long)]
    max_pages: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Remember project, global secret, output and limits for later runs
    #[arg(long)]
    save: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = level.as_filter()?;
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ftprov {} started with log level: {:?}", env!("CARGO_PKG_VERSION"), level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(app_dir) = Config::app_dir() {
        return app_dir.join("ftprov.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ftprov").join("ftprov.log");
    }
    PathBuf::from("ftprov.log")
}

fn nth(values: &[String], i: usize) -> &str {
    values.get(i).map(String::as_str).unwrap_or("")
}

/// Requests for the chosen target
///
/// Single-kind targets use the first service/config pair; `all` gives the
/// first pair to the connector and the second to the destination.
fn build_requests(args: &Args) -> Vec<ResourceRequest> {
    let group = args.group_name.as_str();
    let mut pair = 0;

    args.target
        .kinds()
        .iter()
        .map(|&kind| {
            if !kind.needs_group() {
                return ResourceRequest::warehouse(group);
            }
            let (service, config) = (nth(&args.services, pair), nth(&args.configs, pair));
            pair += 1;
            match (kind, &args.destination_secret) {
                (ResourceKind::Destination, Some(secret)) => {
                    ResourceRequest::destination(group, service, config).with_destination_secret(secret)
                }
                (ResourceKind::Destination, None) => ResourceRequest::destination(group, service, config),
                _ => ResourceRequest::connector(group, service, config),
            }
        })
        .collect()
}

async fn open_secret_store(args: &Args, config: &Config, http: &HttpClient) -> Result<Box<dyn SecretStore>> {
    if let Some(path) = &args.secrets_file {
        return Ok(Box::new(FileSecretStore::load(path)?));
    }

    let project = config.effective_project();
    if project.is_empty() {
        return Err(anyhow::anyhow!(
            "No GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project flag"
        ));
    }

    tracing::info!("Reading secrets from project {}", project);

    let tokens = TokenSource::discover(args.access_token.as_deref()).await?;
    let client = GcpClient::new(&project, tokens, http.clone());
    Ok(Box::new(SecretManagerStore::new(client)))
}

async fn run(args: Args) -> Result<bool> {
    let mut config = Config::load();
    if let Some(project) = &args.project {
        config.project_id = Some(project.clone());
    }
    if let Some(secret) = &args.global_secret {
        config.global_secret_id = Some(secret.clone());
    }
    if let Some(output) = &args.output {
        config.output_path = Some(output.clone());
    }
    if args.max_pages.is_some() {
        config.max_pages = args.max_pages;
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }

    tracing::info!("Target: {:?}, group: {}", args.target, args.group_name);

    let http = HttpClient::with_timeout(config.effective_timeout())?;
    let store = open_secret_store(&args, &config, &http).await?;

    let global_secret = config.effective_global_secret();
    let provider = ProviderConfig::load(store.as_ref(), &global_secret)
        .await
        .with_context(|| format!("Failed to load provider settings from '{}'", global_secret))?;
    tracing::info!("Provider: {}", provider.base_url());

    let client = FivetranClient::new(provider, http);
    let sink = FileSink::new(config.effective_output());
    let provisioner = Provisioner::new(&client, store.as_ref(), &sink)
        .with_max_pages(config.effective_max_pages());

    let report = provisioner.run(build_requests(&args)).await;

    for step in &report.steps {
        println!("{}", step.summary());
    }
    tracing::info!(
        "Run {} finished in {} ms",
        report.run_id,
        (report.finished_at - report.started_at).num_milliseconds()
    );

    if args.save {
        config.save()?;
    }

    Ok(report.is_success())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_level);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_api_error(&err));
            ExitCode::FAILURE
        }
    }
}
