use std::time::Duration;

/// Failure reported by a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable(String),
    Timeout,
    Rejected(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
            StoreError::Timeout => write!(f, "store call timed out"),
            StoreError::Rejected(e) => write!(f, "store rejected the operation: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug)]
pub enum IntakeError {
    /// Too many admissions for this requester; try again after `retry_after`.
    RateLimited { retry_after: Duration },
    InvalidRequest(&'static str),
    LimitExceeded(&'static str),
    /// Persisting an admitted request failed. Lookup failures never surface here.
    Store(StoreError),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::RateLimited { retry_after } => {
                write!(f, "rate limited: retry in {}s", retry_after.as_secs().max(1))
            }
            IntakeError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            IntakeError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            IntakeError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for IntakeError {
    fn from(e: StoreError) -> Self {
        IntakeError::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    InvalidBusinessId(&'static str),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for TenantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantError::InvalidBusinessId(msg) => write!(f, "invalid business id: {msg}"),
            TenantError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for TenantError {}
