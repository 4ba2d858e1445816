use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed row in '{table}': {reason}")]
    Malformed { table: &'static str, reason: String },
}

impl DatastoreError {
    pub fn malformed(table: &'static str, reason: impl Into<String>) -> Self {
        DatastoreError::Malformed {
            table,
            reason: reason.into(),
        }
    }
}
