//! Storage capability consumed by the catalog service.

mod memory;
mod sqlite;

pub use memory::MemoryBookRepository;
pub use sqlite::SqliteBookRepository;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookId, BookPatch, CopiesUpdate, NewBook, Removal};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row does not satisfy the book model
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistent store for books.
///
/// `adjust_copies` and `delete` are conditional: the check and the write
/// happen as one atomic step in the store.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Persist a new record and return it with its assigned id
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book>;

    async fn find_by_id(&self, id: BookId) -> RepositoryResult<Option<Book>>;

    async fn find_all(&self) -> RepositoryResult<Vec<Book>>;

    /// Exact, case-sensitive category match
    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Book>>;

    /// Books with `published_year` strictly greater than `year`
    async fn find_published_after(&self, year: i32) -> RepositoryResult<Vec<Book>>;

    /// Apply a direct field update; `None` when no such record exists
    async fn update(&self, id: BookId, patch: &BookPatch) -> RepositoryResult<Option<Book>>;

    /// Add `delta` to the stock unless the result would be negative
    async fn adjust_copies(&self, id: BookId, delta: i64) -> RepositoryResult<CopiesUpdate>;

    /// Remove the record only when it holds no copies
    async fn delete(&self, id: BookId) -> RepositoryResult<Removal>;
}
