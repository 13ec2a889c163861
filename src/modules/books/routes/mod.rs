//! HTTP handlers for the books module.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use biblio_http::error::AppError;
use serde_json::json;
use uuid::Uuid;

use super::error::CatalogError;
use super::models::{Book, BookCandidate, BookId, CategoryChange, CopiesChange};
use super::service::BookCatalogService;

type ApiResult<T> = Result<T, AppError>;

/// Routes relative to the module mount point.
pub fn router(service: BookCatalogService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/category/{category}", get(list_by_category))
        .route("/after/{year}", get(list_published_after))
        .route("/{id}", axum::routing::delete(delete_book))
        .route("/{id}/copies", put(adjust_copies))
        .route("/{id}/category", put(update_category))
        .with_state(service)
}

/// Unparseable ids cannot name a stored book.
fn parse_id(raw: &str) -> Result<BookId, CatalogError> {
    Uuid::parse_str(raw).map_err(|_| CatalogError::NotFound(raw.to_string()))
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(service): State<BookCatalogService>,
    payload: Result<Json<BookCandidate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let Json(candidate) = payload?;
    let book = service.create_book(candidate).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(State(service): State<BookCatalogService>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(service.list_all().await?))
}

async fn list_by_category(
    State(service): State<BookCatalogService>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(service.list_by_category(&category).await?))
}

async fn list_published_after(
    State(service): State<BookCatalogService>,
    year: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Vec<Book>>> {
    let Path(year) = year?;
    Ok(Json(service.list_published_after(year).await?))
}

async fn adjust_copies(
    State(service): State<BookCatalogService>,
    Path(id): Path<String>,
    payload: Result<Json<CopiesChange>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let id = parse_id(&id)?;
    let Json(CopiesChange { change }) = payload?;
    Ok(Json(service.adjust_copies(id, change).await?))
}

async fn update_category(
    State(service): State<BookCatalogService>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryChange>, JsonRejection>,
) -> ApiResult<Json<Book>> {
    let id = parse_id(&id)?;
    let Json(CategoryChange { category }) = payload?;
    Ok(Json(service.update_category(id, &category).await?))
}

async fn delete_book(
    State(service): State<BookCatalogService>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_id(&id)?;
    service.delete_book(id).await?;
    Ok(Json(json!({ "message": "Book deleted" })))
}
