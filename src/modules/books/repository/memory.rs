use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookRepository, RepositoryResult};
use crate::modules::books::models::{Book, BookId, BookPatch, CopiesUpdate, NewBook, Removal};

/// Process-local store kept in insertion order.
///
/// Conditional operations hold the write lock across check and write.
#[derive(Default)]
pub struct MemoryBookRepository {
    books: RwLock<Vec<Book>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(books: &[Book], predicate: impl Fn(&Book) -> bool) -> Vec<Book> {
        books.iter().filter(|&b| predicate(b)).cloned().collect()
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book> {
        let book = book.into_book(Uuid::now_v7());
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: BookId) -> RepositoryResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(Self::filtered(&books, |b| b.category == category))
    }

    async fn find_published_after(&self, year: i32) -> RepositoryResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(Self::filtered(&books, |b| b.published_year > year))
    }

    async fn update(&self, id: BookId, patch: &BookPatch) -> RepositoryResult<Option<Book>> {
        let mut books = self.books.write().await;
        Ok(books.iter_mut().find(|b| b.id == id).map(|book| {
            patch.apply(book);
            book.clone()
        }))
    }

    async fn adjust_copies(&self, id: BookId, delta: i64) -> RepositoryResult<CopiesUpdate> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(CopiesUpdate::Missing);
        };

        let next = i64::from(book.available_copies).checked_add(delta);
        match next.and_then(|n| u32::try_from(n).ok()) {
            Some(copies) => {
                book.available_copies = copies;
                Ok(CopiesUpdate::Applied(book.clone()))
            }
            None => Ok(CopiesUpdate::OutOfRange {
                available: book.available_copies,
            }),
        }
    }

    async fn delete(&self, id: BookId) -> RepositoryResult<Removal> {
        let mut books = self.books.write().await;
        let Some(index) = books.iter().position(|b| b.id == id) else {
            return Ok(Removal::Missing);
        };

        match books[index].available_copies {
            0 => {
                books.remove(index);
                Ok(Removal::Removed)
            }
            available => Ok(Removal::InStock { available }),
        }
    }
}
