use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TurbidostatError {
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("short read: expected 8 bytes, got {0}")]
    ShortRead(usize),
    #[error("malformed exchange: {0}")]
    Malformed(String),
    #[error("division by zero computing OD")]
    DivisionByZero,
    #[error("no blank calibration captured")]
    NoBlank,
    #[error("state storage failure: {0}")]
    Storage(String),
}

impl TurbidostatError {
    /// Errors that only spoil the current cycle; the loop carries on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ShortRead(_) | Self::Malformed(_) | Self::DivisionByZero
        )
    }
}

/// Failures of the persisted state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no saved state")]
    NotFound,
    #[error("saved state is unreadable: {0}")]
    Corrupt(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for TurbidostatError {
    fn from(e: StoreError) -> Self {
        TurbidostatError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TurbidostatError>;
