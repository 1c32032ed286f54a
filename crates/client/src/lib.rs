mod client;
mod error;
mod options;
mod response;

pub use client::{Client, ClientBuilder};
pub use error::{ClientError, Result};
pub use options::{Format, LoadOptions};
pub use response::LoadResponse;

/// Database and table a batch is loaded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub db: String,
    pub table: String,
}

impl Destination {
    pub fn new(db: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            table: table.into(),
        }
    }

    /// Path of the stream load endpoint, relative to the FE base url.
    pub fn stream_load_path(&self) -> String {
        format!("/api/{}/{}/_stream_load", self.db, self.table)
    }
}

/// Commits one serialized batch to the remote store.
///
/// [`Client`] is the HTTP implementation; tests substitute their own.
pub trait Transport: Send + Sync {
    fn commit(
        &self,
        payload: &[u8],
        destination: &Destination,
        options: &LoadOptions,
    ) -> Result<LoadResponse>;
}
