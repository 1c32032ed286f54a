mod config;
pub mod logging;

pub use config::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_BYTES, DEFAULT_MAX_RECORDS, DEFAULT_NUM_WORKERS,
    DEFAULT_RETRY_STATUS_CODES, PASSWORD_ENV, PROGRAM_LOG_LEVEL, PROGRAM_NAME, VERSION,
    user_agent,
};

pub use logging::init;
