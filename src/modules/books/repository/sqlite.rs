//! SQLite-backed book store.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{BookRepository, RepositoryError, RepositoryResult};
use crate::modules::books::models::{Book, BookId, BookPatch, CopiesUpdate, NewBook, Removal};

const COLUMNS: &str = "id, title, author, category, published_year, available_copies";

#[derive(Clone, Copy)]
enum Filter<'a> {
    All,
    Category(&'a str),
    PublishedAfter(i32),
}

/// Catalog store over the `books` table created by the books module migration.
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, filter: Filter<'_>) -> RepositoryResult<Vec<Book>> {
        let clause = match filter {
            Filter::All => "",
            Filter::Category(_) => "WHERE category = ?",
            Filter::PublishedAfter(_) => "WHERE published_year > ?",
        };
        let sql = format!("SELECT {COLUMNS} FROM books {clause} ORDER BY seq");

        let query = sqlx::query(&sql);
        let query = match filter {
            Filter::All => query,
            Filter::Category(category) => query.bind(category),
            Filter::PublishedAfter(year) => query.bind(year),
        };

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_book).collect()
    }

    async fn current_copies(&self, id: BookId) -> RepositoryResult<Option<u32>> {
        let row = sqlx::query("SELECT available_copies FROM books WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| copies_column(&row)).transpose()
    }
}

fn copies_column(row: &SqliteRow) -> RepositoryResult<u32> {
    let copies: i64 = row.try_get("available_copies")?;
    u32::try_from(copies)
        .map_err(|_| RepositoryError::Corrupt(format!("available_copies out of range: {copies}")))
}

fn row_to_book(row: &SqliteRow) -> RepositoryResult<Book> {
    let id: String = row.try_get("id")?;
    let year: i64 = row.try_get("published_year")?;

    Ok(Book {
        id: Uuid::parse_str(&id)
            .map_err(|e| RepositoryError::Corrupt(format!("invalid book id '{id}': {e}")))?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        category: row.try_get("category")?,
        published_year: i32::try_from(year)
            .map_err(|_| RepositoryError::Corrupt(format!("published_year out of range: {year}")))?,
        available_copies: copies_column(row)?,
    })
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn insert(&self, book: NewBook) -> RepositoryResult<Book> {
        let book = book.into_book(Uuid::now_v7());

        sqlx::query(
            "INSERT INTO books (id, title, author, category, published_year, available_copies)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.published_year)
        .bind(i64::from(book.available_copies))
        .execute(&self.pool)
        .await?;

        Ok(book)
    }

    async fn find_by_id(&self, id: BookId) -> RepositoryResult<Option<Book>> {
        let sql = format!("SELECT {COLUMNS} FROM books WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_book).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Book>> {
        self.fetch_many(Filter::All).await
    }

    async fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<Book>> {
        self.fetch_many(Filter::Category(category)).await
    }

    async fn find_published_after(&self, year: i32) -> RepositoryResult<Vec<Book>> {
        self.fetch_many(Filter::PublishedAfter(year)).await
    }

    async fn update(&self, id: BookId, patch: &BookPatch) -> RepositoryResult<Option<Book>> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE books SET ");
        let mut assignments = builder.separated(", ");
        if let Some(category) = &patch.category {
            assignments.push("category = ");
            assignments.push_bind_unseparated(category.clone());
        }
        if let Some(copies) = patch.available_copies {
            assignments.push("available_copies = ");
            assignments.push_bind_unseparated(i64::from(copies));
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());
        builder.push(format!(" RETURNING {COLUMNS}"));

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_book).transpose()
    }

    async fn adjust_copies(&self, id: BookId, delta: i64) -> RepositoryResult<CopiesUpdate> {
        // A delta wider than the stock range can never apply; keep it out of
        // SQL arithmetic, where it could overflow.
        if delta.unsigned_abs() > u64::from(u32::MAX) {
            return Ok(match self.current_copies(id).await? {
                Some(available) => CopiesUpdate::OutOfRange { available },
                None => CopiesUpdate::Missing,
            });
        }

        let sql = format!(
            "UPDATE books SET available_copies = available_copies + ?1
             WHERE id = ?2
               AND available_copies + ?1 >= 0
               AND available_copies + ?1 <= {max}
             RETURNING {COLUMNS}",
            max = u32::MAX
        );
        let row = sqlx::query(&sql)
            .bind(delta)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(CopiesUpdate::Applied(row_to_book(&row)?));
        }

        // Nothing matched: tell a missing record from a rejected change.
        Ok(match self.current_copies(id).await? {
            Some(available) => CopiesUpdate::OutOfRange { available },
            None => CopiesUpdate::Missing,
        })
    }

    async fn delete(&self, id: BookId) -> RepositoryResult<Removal> {
        let result = sqlx::query("DELETE FROM books WHERE id = ? AND available_copies = 0")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Removal::Removed);
        }

        Ok(match self.current_copies(id).await? {
            Some(available) => Removal::InStock { available },
            None => Removal::Missing,
        })
    }
}
