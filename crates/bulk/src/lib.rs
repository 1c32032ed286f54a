mod backoff;
mod batch;
mod error;
mod listener;
mod processor;
mod retry;
mod worker;

#[cfg(test)]
mod testing;

pub use backoff::{Backoff, ConstantBackoff, ExponentialBackoff, StopBackoff};
pub use batch::{Batch, Record};
pub use error::{BulkError, Result};
pub use listener::{CommitInfo, CommitListener, LogListener};
pub use processor::{BulkProcessor, BulkProcessorBuilder};
pub use retry::{RetryNotice, RetryPolicy, retry_notify};

pub use dorisload_client::{
    Client, ClientError, Destination, Format, LoadOptions, LoadResponse, Transport,
};
