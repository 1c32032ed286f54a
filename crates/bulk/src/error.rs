use dorisload_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BulkError {
    /// The processor can never commit with this configuration.
    #[error("invalid bulk processor configuration: {0}")]
    Config(String),

    #[error("bulk processor {0:?} is not started")]
    NotStarted(String),

    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A batch was dropped after its retries ran out.
    #[error("worker {worker} failed to commit {records} records after {attempts} attempts: {source}")]
    Commit {
        worker: usize,
        records: usize,
        attempts: u32,
        #[source]
        source: ClientError,
    },

    #[error("thread {0} panicked")]
    Panicked(String),
}

pub type Result<T, E = BulkError> = std::result::Result<T, E>;
