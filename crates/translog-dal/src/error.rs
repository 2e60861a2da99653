pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),
}
