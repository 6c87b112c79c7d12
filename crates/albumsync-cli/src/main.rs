//! albumsync - mirror a local photo directory with a Flickr album
//!
//! Uploads local photos that are missing from the album, downloads album
//! photos that are missing locally, and optionally removes what only exists
//! on the destination side. Checksum tags detect edited photos.

mod display;

use albumsync_config::{Config, ConfigLoader, LoggingConfig, LOG_LEVELS};
use albumsync_flickr::FlickrService;
use albumsync_sync::{SyncEngine, SyncOptions, SyncRequest};
use albumsync_types::{Error, ErrorKind, SyncMode};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Exit code for invalid flags or configuration
const EXIT_CONFIG: u8 = 2;

/// Exit code for any other failure
const EXIT_FAILURE: u8 = 1;

/// albumsync - mirror a local photo directory with a Flickr album
#[derive(Parser, Debug)]
#[command(
    name = "albumsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mirror a local photo directory with a Flickr album",
    long_about = "albumsync compares a local directory with a Flickr album by file name and,\n\
                  optionally, by content checksum. It uploads (--push), downloads (--pull)\n\
                  and prunes (--sync) photos so that the destination matches the source."
)]
struct Cli {
    /// Name of the Flickr album
    #[arg(long)]
    album: String,

    /// Local directory to sync
    #[arg(long)]
    path: PathBuf,

    /// Local is the source, the album is the destination
    #[arg(long)]
    push: bool,

    /// The album is the source, local is the destination
    #[arg(long)]
    pull: bool,

    /// Delete destination photos that are absent from the source
    #[arg(long)]
    sync: bool,

    /// Store content checksums as tags and use them to detect edits
    #[arg(long)]
    checksum: bool,

    /// Ignore album photos without this tag; uploads get the tag
    #[arg(long)]
    tag: Option<String>,

    /// Show what would be done without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Directory holding config.yaml or config.toml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Credentials profile from the configuration file
    #[arg(long)]
    config_profile: Option<String>,

    /// Flickr API key, overrides the configuration file
    #[arg(long)]
    api_key: Option<String>,

    /// Flickr API secret, overrides the configuration file
    #[arg(long)]
    api_secret: Option<String>,

    /// Number of transfers kept in flight at once (1-32)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log level
    #[arg(long, value_parser = LOG_LEVELS)]
    log_level: Option<String>,

    /// Log file path, or "stderr"
    #[arg(long)]
    log_file: Option<String>,
}

impl Cli {
    fn mode(&self) -> SyncMode {
        SyncMode {
            push: self.push,
            pull: self.pull,
            prune: self.sync,
            checksum: self.checksum,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return report_error(&e),
    };

    let _guard = match init_logging(&config.logging, cli.log_level.is_some()) {
        Ok(guard) => guard,
        Err(e) => return report_error(&e),
    };

    info!("albumsync v{} starting", env!("CARGO_PKG_VERSION"));

    match sync_command(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

/// Load the configuration and apply command line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config_dir {
        Some(dir) => ConfigLoader::load_from_dir(dir),
        None => ConfigLoader::load_default(),
    }
    .map_err(Error::from)
    .context("Failed to load configuration")?;

    let mut credentials = config
        .credentials_for(cli.config_profile.as_deref())
        .map_err(Error::from)?
        .clone();
    if let Some(api_key) = &cli.api_key {
        credentials.api_key = api_key.clone();
    }
    if let Some(api_secret) = &cli.api_secret {
        credentials.api_secret = api_secret.clone();
    }
    config.credentials = credentials;

    if let Some(tag) = &cli.tag {
        config.sync.tag = Some(tag.clone());
    }
    if let Some(concurrency) = cli.concurrency {
        config.sync.concurrency = concurrency;
    }
    config.sync.dry_run |= cli.dry_run;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    match cli.log_file.as_deref() {
        Some("stderr") => config.logging.log_file = None,
        Some(path) => config.logging.log_file = Some(PathBuf::from(path)),
        None => {}
    }

    Ok(config)
}

/// Initialize tracing; `explicit_level` makes the configured level win over `RUST_LOG`
fn init_logging(logging: &LoggingConfig, explicit_level: bool) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if explicit_level {
        EnvFilter::try_new(&logging.level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))
    }
    .map_err(|e| Error::config(format!("Invalid log level '{}': {}", logging.level, e)))?;

    let (writer, guard) = match &logging.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("Invalid log file '{}'", path.display())))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(logging.log_file.is_none())
        .with_writer(writer);

    if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}

async fn sync_command(cli: &Cli, config: &Config) -> Result<()> {
    let mut options = SyncOptions::new(cli.mode())
        .with_dry_run(config.sync.dry_run)
        .with_concurrency(config.sync.concurrency().map_err(Error::from)?);
    if let Some(tag) = &config.sync.tag {
        options = options.with_tag(tag.clone());
    }
    options.validate()?;

    if options.dry_run {
        println!("{}", style(display::DRY_RUN_NOTE).yellow());
    }

    let service = FlickrService::from_settings(&config.credentials, &config.network)?;
    let mut engine = SyncEngine::new(Arc::new(service));
    let mut events = engine
        .take_event_receiver()
        .ok_or_else(|| anyhow!("Narration channel already taken"))?;

    let spinner = display::create_spinner(false);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            display::render_event(&event, spinner.as_ref());
        }
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
    });

    let request = SyncRequest::new(&cli.album, &cli.path).with_options(options.clone());
    let result = engine.run(request).await;
    let stats = engine.reporter().get_progress().await.stats;

    // Dropping the engine closes the channel and lets the printer drain it.
    drop(engine);
    printer.await.context("Narration task failed")?;

    match result {
        Ok(report) => {
            display::print_summary(&report.stats, report.dry_run);
            info!("Sync {} finished", report.request_id);
            Ok(())
        }
        Err(e) => {
            if !e.failures().is_empty() {
                display::print_summary(&stats, options.dry_run);
                display::print_failures(e.failures());
            }
            Err(e.into())
        }
    }
}

/// Print an error and map it to the process exit code
fn report_error(error: &anyhow::Error) -> ExitCode {
    eprintln!("{} {:#}", style("error:").red().bold(), error);
    ExitCode::from(exit_code(error))
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(e) if e.kind() == ErrorKind::Config => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}
