/// Version injected at compile time via REIFY_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("REIFY_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reify::api::auth::Credentials;
use reify::api::client::ApiClient;
use reify::api::http::format_api_error;
use reify::api::storage::ResourceStore;
use reify::config::Config;
use reify::render::{render, target};
use reify::resource::ResourceId;
use reify::{CacheMode, ReifyError, ResolveOptions, Resolver};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Rebuild the API calls that created a resource and its ancestors
#[derive(Parser, Debug)]
#[command(name = "reify", version, about, long_about = None)]
struct Args {
    /// Resource to reify, e.g. model/5143a51a37203f2cf7000972
    #[arg(short, long, value_parser = parse_resource_id)]
    id: ResourceId,

    /// Output language (python or json)
    #[arg(short, long)]
    language: Option<String>,

    /// File the script is written to
    #[arg(short, long, default_value = "reify.py")]
    output: PathBuf,

    /// Keep the fetched resources in the storage directory
    #[arg(long)]
    store: bool,

    /// Directory for fetched resources
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Carry field renames, types, labels and descriptions of sources over
    #[arg(long)]
    add_fields: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

fn parse_resource_id(raw: &str) -> Result<ResourceId, String> {
    ResourceId::parse(raw).map_err(|e| e.to_string())
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
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("reify {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("reify").join("reify.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".reify").join("reify.log");
    }
    PathBuf::from("reify.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            match err.downcast_ref::<ReifyError>() {
                Some(reify_error) => eprintln!("{}", reify_error),
                None => eprintln!("Error: {}", format_api_error(&err)),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    let language = config.effective_language(args.language.clone());
    // Fail on an unknown language before any request is made
    target(&language)?;

    let credentials = Credentials::resolve(&config)?;
    let domain = config.effective_domain();
    let storage = config.effective_storage(args.storage.clone());
    tracing::info!("Using domain: {}, storage: {:?}", domain, storage);

    // Without --store the copies only live for this run
    let cache = if args.store {
        CacheMode::External
    } else {
        CacheMode::Owned
    };
    let client = ApiClient::new(credentials, &domain)?.with_store(ResourceStore::new(storage));

    let resolver = Resolver::new(
        &client,
        ResolveOptions {
            add_fields: args.add_fields,
            cache,
        },
    );
    let chain = resolver.resolve(&args.id.to_string()).await?;
    let script = render(&chain, &language)?;

    std::fs::write(&args.output, script)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(store) = client.store() {
        if store.pending() > 0 {
            tracing::debug!("{} stored resources left in {:?}", store.pending(), store.dir());
        }
    }
    tracing::info!(
        "Wrote {} calls for {} to {:?}",
        chain.calls.values().map(Vec::len).sum::<usize>(),
        args.id,
        args.output
    );
    Ok(())
}
