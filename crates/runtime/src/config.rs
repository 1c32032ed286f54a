use std::time::Duration;

pub const PROGRAM_NAME: &str = "dorisload";
pub const PROGRAM_LOG_LEVEL: &str = "DORISLOAD_LOG_LEVEL";
pub const PASSWORD_ENV: &str = "DORISLOAD_PASSWORD";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of workers used when the caller does not ask for more.
pub const DEFAULT_NUM_WORKERS: usize = 1;

/// Records per batch before a commit is forced.
pub const DEFAULT_MAX_RECORDS: usize = 1000;

/// Estimated payload size per batch before a commit is forced (5 MiB).
pub const DEFAULT_MAX_BYTES: usize = 5 << 20;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP status codes for which a failed stream load is worth retrying.
pub const DEFAULT_RETRY_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// User agent sent with every stream load request,
/// e.g. `dorisload/0.1.0 (linux-x86_64)`.
pub fn user_agent() -> String {
    format!(
        "{}/{} ({}-{})",
        PROGRAM_NAME,
        VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
