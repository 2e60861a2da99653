use axum::response::IntoResponse;
use http::StatusCode;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Record not found")]
    NotFound,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Dal(#[from] translog_dal::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::InvalidQuery(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Dal(translog_dal::Error::RecordNotFound(_)) => {
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Dal(translog_dal::Error::DatabaseError(translog_dal::SqlxError::RowNotFound)) => {
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Dal(translog_dal::Error::InvalidSortField(field)) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid sort field: {field}"),
            )
                .into_response(),
            // do not leak store details to the client
            ApiError::Dal(error) => {
                error!("Store error: {error}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
