use railtag_types::{ComponentStatus, TypeError};

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced component does not exist.
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// A component with this QR code already exists.
    #[error("duplicate QR code: {0}")]
    DuplicateQrCode(String),

    /// A component with this id already exists.
    #[error("duplicate component id: {0}")]
    DuplicateComponentId(String),

    /// The requested lifecycle transition is not allowed.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ComponentStatus,
        to: ComponentStatus,
    },

    /// Bounded lock acquisition or transaction wait expired. Safe to retry.
    #[error("store operation timed out: {0}")]
    Timeout(String),

    /// The backend cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded back into its domain type.
    #[error("corrupt {what} record: {reason}")]
    Corrupt { what: &'static str, reason: String },

    /// Serialization failure (device-info bag, etc.).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other database-level failure.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => {
                Self::Timeout("connection pool acquisition timed out".into())
            }
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                let lowered = message.to_lowercase();
                if lowered.contains("database is locked") || lowered.contains("busy") {
                    Self::Timeout(message)
                } else if db.is_unique_violation() {
                    if message.contains("qr_code") {
                        Self::DuplicateQrCode(message)
                    } else if message.contains("component_id") {
                        Self::DuplicateComponentId(message)
                    } else {
                        Self::Database(err)
                    }
                } else {
                    Self::Database(err)
                }
            }
            _ => Self::Database(err),
        }
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::Corrupt {
                what: "domain value",
                reason: other.to_string(),
            },
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
