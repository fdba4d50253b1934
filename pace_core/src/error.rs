use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaceError {
    #[error("invalid target rate: {rate} Hz (expected a positive, finite rate)")]
    InvalidRate { rate: f64 },

    #[error("invalid config: {0}")]
    Config(String),
}

pub type PaceResult<T> = Result<T, PaceError>;
