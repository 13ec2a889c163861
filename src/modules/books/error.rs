use biblio_http::error::AppError;
use thiserror::Error;

use super::models::{BookId, FieldError};
use super::repository::RepositoryError;

/// Failures of catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid book data")]
    Validation(Vec<FieldError>),

    #[error("book {0} not found")]
    NotFound(String),

    /// A business rule refused the operation; state is unchanged
    #[error("{0}")]
    InvalidOperation(&'static str),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl CatalogError {
    pub fn not_found(id: BookId) -> Self {
        Self::NotFound(id.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(fields) => AppError::validation(
                fields
                    .iter()
                    .map(|f| serde_json::json!({ "field": f.field, "error": f.error }))
                    .collect(),
                "Invalid book data",
            ),
            CatalogError::NotFound(_) => AppError::not_found("Book not found"),
            CatalogError::InvalidOperation(message) => AppError::bad_request(message),
            CatalogError::Storage(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn catalog_errors_map_to_http_statuses() {
        let validation = CatalogError::Validation(vec![FieldError {
            field: "title",
            error: "required",
        }]);
        assert_eq!(AppError::from(validation).status(), StatusCode::BAD_REQUEST);

        let missing = CatalogError::not_found(BookId::nil());
        assert_eq!(AppError::from(missing).status(), StatusCode::NOT_FOUND);

        let refused = CatalogError::InvalidOperation("Negative stock not allowed");
        let app_error = AppError::from(refused);
        assert_eq!(app_error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app_error.to_string(), "bad request: Negative stock not allowed");

        let storage = CatalogError::Storage(RepositoryError::Corrupt("bad row".to_string()));
        assert_eq!(
            AppError::from(storage).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
