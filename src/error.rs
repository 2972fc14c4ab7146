use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrrSchedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing header tag '{tag}' in {path:?}")]
    MissingHeaderTag { tag: String, path: PathBuf },

    #[error("No simulated row for HRU {hru} on {date}")]
    MissingSimulationRow { hru: u32, date: NaiveDate },

    #[error("Malformed table {path:?} at line {line}: {reason}")]
    MalformedTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, IrrSchedError>;
