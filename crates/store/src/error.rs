/// Errors returned by the item store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A `limit` argument could not be read as a non-negative integer.
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// An item id argument could not be read as an integer.
    #[error("invalid item id: {0}")]
    InvalidId(String),
}
