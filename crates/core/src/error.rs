use crate::quota::QuotaAction;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Quota reached for {action}: {used}/{limit}")]
    QuotaExceeded {
        action: QuotaAction,
        used: u64,
        limit: u64,
    },
}
