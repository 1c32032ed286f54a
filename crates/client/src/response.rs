use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Body returned by the stream load endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadResponse {
    #[serde(rename = "TxnId")]
    pub txn_id: i64,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ExistingJobStatus")]
    pub existing_job_status: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "NumberTotalRows")]
    pub number_total_rows: u64,
    #[serde(rename = "NumberLoadedRows")]
    pub number_loaded_rows: u64,
    #[serde(rename = "NumberFilteredRows")]
    pub number_filtered_rows: u64,
    #[serde(rename = "NumberUnselectedRows")]
    pub number_unselected_rows: u64,
    #[serde(rename = "LoadBytes")]
    pub load_bytes: u64,
    #[serde(rename = "LoadTimeMs")]
    pub load_time_ms: u64,
    #[serde(rename = "ErrorURL")]
    pub error_url: String,
}

impl LoadResponse {
    /// Whether the rows of this request are (or already were) loaded.
    ///
    /// `Label Already Exists` with a finished job means an earlier attempt
    /// with the same label went through.
    pub fn is_success(&self) -> bool {
        match self.status.as_str() {
            "Success" | "Publish Timeout" => true,
            "Label Already Exists" => self.existing_job_status == "FINISHED",
            _ => false,
        }
    }

    pub(crate) fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(ClientError::Rejected {
            status: self.status,
            message: self.message,
            error_url: (!self.error_url.is_empty()).then_some(self.error_url),
        })
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
