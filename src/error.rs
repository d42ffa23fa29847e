use crate::content::Mode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no passages available for {0} mode")]
    EmptyPool(Mode),

    #[error("passage pool {name} is malformed: {reason}")]
    MalformedPool { name: String, reason: String },

    #[error("unsupported duration {0}s (expected one of 30, 60, 120)")]
    UnsupportedDuration(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
