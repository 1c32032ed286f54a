use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use dorisload_bulk::{
    BulkProcessor, BulkProcessorBuilder, Client, CommitListener, Destination, ExponentialBackoff,
    Format, LoadOptions,
};
use dorisload_runtime::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_BYTES, DEFAULT_MAX_RECORDS, DEFAULT_NUM_WORKERS,
    PASSWORD_ENV,
};
use log::{debug, error};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

use crate::input::{Input, drain_feed, spawn_feed};
use crate::summary::SummaryListener;

/// How often the loader checks for a shutdown signal while input is idle.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    /// One JSON object per line
    Json,
}

impl From<FormatArg> for Format {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => Format::Csv,
            FormatArg::Json => Format::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// FE base URL, e.g. http://fe-host:8030
    #[arg(long)]
    pub url: String,

    #[arg(long, short = 'u', default_value = "root")]
    pub user: String,

    #[arg(long, short = 'p', env = PASSWORD_ENV, default_value = "", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub db: String,

    #[arg(long)]
    pub table: String,

    /// Number of concurrent workers
    #[arg(long, short = 'w', default_value_t = DEFAULT_NUM_WORKERS)]
    pub workers: usize,

    /// Records per batch before a commit (0 disables)
    #[arg(long, default_value_t = DEFAULT_MAX_RECORDS)]
    pub max_records: usize,

    /// Estimated bytes per batch before a commit (0 disables)
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: usize,

    /// Periodic flush interval in milliseconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_FLUSH_INTERVAL.as_millis() as u64)]
    pub flush_interval_ms: u64,

    /// Attempts per batch, the first one included
    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,

    /// HTTP status codes worth retrying, comma separated
    #[arg(long, value_delimiter = ',')]
    pub retry_status: Vec<u16>,

    /// Prefix of the per-commit stream load labels
    #[arg(long)]
    pub label_prefix: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    #[arg(long)]
    pub columns: Option<String>,

    #[arg(long)]
    pub column_separator: Option<String>,

    #[arg(long = "where")]
    pub where_clause: Option<String>,

    #[arg(long)]
    pub partitions: Option<String>,

    #[arg(long)]
    pub max_filter_ratio: Option<f64>,

    #[arg(long)]
    pub strict_mode: bool,

    /// Log every request at debug level
    #[arg(long)]
    pub debug: bool,

    /// Input files; stdin when empty or `-`
    pub inputs: Vec<PathBuf>,
}

impl LoadArgs {
    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::new().format(self.format.into());

        if let Some(columns) = &self.columns {
            options = options.columns(columns.as_str());
        }
        if let Some(separator) = &self.column_separator {
            options = options.column_separator(separator.as_str());
        }
        if let Some(filter) = &self.where_clause {
            options = options.where_clause(filter.as_str());
        }
        if let Some(partitions) = &self.partitions {
            options = options.partitions(partitions.as_str());
        }
        if let Some(ratio) = self.max_filter_ratio {
            options = options.max_filter_ratio(ratio);
        }
        if self.strict_mode {
            options = options.strict_mode(true);
        }
        options
    }

    pub fn client(&self) -> Result<Client> {
        let mut builder = Client::builder(self.url.as_str())
            .basic_auth(self.user.as_str(), self.password.as_str())
            .debug(self.debug);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
            .build()
            .with_context(|| format!("invalid FE url {}", self.url))
    }

    pub fn processor(
        &self,
        client: Client,
        listener: Arc<dyn CommitListener>,
    ) -> BulkProcessorBuilder {
        let backoff = ExponentialBackoff {
            max_attempts: Some(self.max_attempts),
            ..ExponentialBackoff::default()
        };

        let mut builder = BulkProcessor::builder(
            Arc::new(client),
            Destination::new(self.db.as_str(), self.table.as_str()),
        )
        .workers(self.workers)
        .max_records(self.max_records)
        .max_bytes(self.max_bytes)
        .flush_interval(Duration::from_millis(self.flush_interval_ms))
        .backoff(Arc::new(backoff))
        .load_options(self.load_options())
        .listener(listener);

        if !self.retry_status.is_empty() {
            builder = builder.retry_status_codes(self.retry_status.iter().copied());
        }
        if let Some(prefix) = &self.label_prefix {
            builder = builder.label_prefix(prefix.as_str());
        }
        builder
    }
}

pub fn run(args: LoadArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(e) => {
            error!("[error] {e:#}");
            eprintln!("[load] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: LoadArgs) -> Result<ExitCode> {
    let shutdown = Arc::new(AtomicBool::new(false));

    // The first signal stops reading; a second one exits at once.
    for sig in [SIGINT, SIGTERM] {
        flag::register_conditional_shutdown(sig, 1, Arc::clone(&shutdown))
            .with_context(|| format!("Failed to register signal handler for {sig}"))?;
        flag::register(sig, Arc::clone(&shutdown))
            .with_context(|| format!("Failed to register signal handler for {sig}"))?;
    }

    let listener = Arc::new(SummaryListener::default());
    let processor = args
        .processor(args.client()?, listener.clone())
        .start()
        .context("failed to start bulk processor")?;

    let feed = spawn_feed(Input::from_paths(&args.inputs))?;
    let stats = drain_feed(&feed, &shutdown, SHUTDOWN_POLL, |record| {
        Ok(processor.add(record)?)
    })?;
    drop(feed);

    if stats.interrupted {
        eprintln!("[load] interrupted, committing buffered records");
    }

    // Failed commits are already counted by the listener.
    if let Err(err) = processor.flush() {
        debug!("final flush: {err}");
    }
    processor.close().context("failed to close bulk processor")?;

    let summary = listener.snapshot();
    eprintln!("[load] read:     {} records", stats.records);
    eprintln!("{summary}");

    if summary.is_clean() && !stats.interrupted {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
