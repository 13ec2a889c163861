//! Business rules over the book catalog.

use std::sync::Arc;

use super::error::CatalogError;
use super::models::{Book, BookCandidate, BookId, BookPatch, CopiesUpdate, FieldError, Removal};
use super::repository::BookRepository;

pub type CatalogResult<T> = Result<T, CatalogError>;

pub const NEGATIVE_STOCK: &str = "Negative stock not allowed";
pub const STOCK_LIMIT: &str = "Stock limit exceeded";
pub const COPIES_REMAIN: &str = "Cannot delete book with copies";

/// Catalog operations; stateless apart from the shared store handle.
#[derive(Clone)]
pub struct BookCatalogService {
    repository: Arc<dyn BookRepository>,
}

impl BookCatalogService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Validate a candidate and persist it.
    pub async fn create_book(&self, candidate: BookCandidate) -> CatalogResult<Book> {
        let new_book = candidate.validate().map_err(|fields| {
            tracing::warn!(?fields, "rejected book candidate");
            CatalogError::Validation(fields)
        })?;

        let book = self.repository.insert(new_book).await?;
        tracing::info!(
            book_id = %book.id,
            category = %book.category,
            available_copies = book.available_copies,
            "book created"
        );
        Ok(book)
    }

    pub async fn list_all(&self) -> CatalogResult<Vec<Book>> {
        Ok(self.repository.find_all().await?)
    }

    /// Books whose category matches exactly. Empty when nothing matches.
    pub async fn list_by_category(&self, category: &str) -> CatalogResult<Vec<Book>> {
        Ok(self.repository.find_by_category(category).await?)
    }

    /// Books published strictly after `year`.
    pub async fn list_published_after(&self, year: i32) -> CatalogResult<Vec<Book>> {
        Ok(self.repository.find_published_after(year).await?)
    }

    /// Add `delta` to the available copies. A change that would leave the
    /// stock negative is rejected whole.
    pub async fn adjust_copies(&self, id: BookId, delta: i64) -> CatalogResult<Book> {
        match self.repository.adjust_copies(id, delta).await? {
            CopiesUpdate::Applied(book) => {
                tracing::info!(
                    book_id = %id,
                    delta,
                    available_copies = book.available_copies,
                    "copies adjusted"
                );
                Ok(book)
            }
            CopiesUpdate::OutOfRange { available } => {
                tracing::warn!(book_id = %id, delta, available, "copy adjustment rejected");
                let reason = if delta < 0 { NEGATIVE_STOCK } else { STOCK_LIMIT };
                Err(CatalogError::InvalidOperation(reason))
            }
            CopiesUpdate::Missing => Err(CatalogError::not_found(id)),
        }
    }

    pub async fn update_category(&self, id: BookId, category: &str) -> CatalogResult<Book> {
        let category = category.trim();
        if category.is_empty() {
            return Err(CatalogError::Validation(vec![FieldError {
                field: "category",
                error: "must not be empty",
            }]));
        }

        let book = self
            .repository
            .update(id, &BookPatch::category(category))
            .await?
            .ok_or_else(|| CatalogError::not_found(id))?;

        tracing::info!(book_id = %id, category = %book.category, "category updated");
        Ok(book)
    }

    /// Remove a book, refusing while any copies remain in stock.
    pub async fn delete_book(&self, id: BookId) -> CatalogResult<()> {
        match self.repository.delete(id).await? {
            Removal::Removed => {
                tracing::info!(book_id = %id, "book deleted");
                Ok(())
            }
            Removal::InStock { available } => {
                tracing::warn!(book_id = %id, available, "delete refused, copies remain");
                Err(CatalogError::InvalidOperation(COPIES_REMAIN))
            }
            Removal::Missing => Err(CatalogError::not_found(id)),
        }
    }
}
