//! End-to-end catalog flows over SQLite and the full HTTP stack.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request as HttpRequest, StatusCode},
    Router,
};
use biblio_app::books::{
    repository::MemoryBookRepository, service::BookCatalogService, BooksModule,
};
use biblio_kernel::{settings::Settings, Database, InitCtx, ModuleRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let settings = Settings::default();
    let db = Database::in_memory().await.unwrap();

    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(BooksModule::new()));
    db.apply_migrations(&registry.collect_migrations()).await.unwrap();

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_modules(&ctx).await.unwrap();
    registry.start_modules(&ctx).await.unwrap();

    biblio_http::build_router(&registry, &settings)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = HttpRequest::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn book(title: &str, category: &str, year: i32, copies: i64) -> Value {
    json!({
        "title": title,
        "author": "Herbert",
        "category": category,
        "publishedYear": year,
        "availableCopies": copies
    })
}

#[tokio::test]
async fn dune_stock_lifecycle() {
    let app = app().await;

    let (status, dune) =
        call(&app, Method::POST, "/books", Some(book("Dune", "SciFi", 1965, 3))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dune["availableCopies"], 3);
    let id = dune["id"].as_str().unwrap().to_string();

    let (status, error) = call(
        &app,
        Method::PUT,
        &format!("/books/{id}/copies"),
        Some(json!({ "change": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "bad_request");
    assert_eq!(error["error"]["message"], "Negative stock not allowed");

    let (_, books) = call(&app, Method::GET, "/books", None).await;
    assert_eq!(books[0]["availableCopies"], 3);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/books/{id}/copies"),
        Some(json!({ "change": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["availableCopies"], 0);

    let (status, body) = call(&app, Method::DELETE, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted");

    let (_, books) = call(&app, Method::GET, "/books", None).await;
    assert_eq!(books, json!([]));
}

#[tokio::test]
async fn published_after_is_strict() {
    let app = app().await;
    for year in [2010, 2016, 2020] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/books",
            Some(book(&format!("Book {year}"), "Misc", year, 1)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, books) = call(&app, Method::GET, "/books/after/2015", None).await;
    assert_eq!(status, StatusCode::OK);
    let years: Vec<i64> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["publishedYear"].as_i64().unwrap())
        .collect();
    assert_eq!(years, vec![2016, 2020]);
}

#[tokio::test]
async fn category_listing_and_update() {
    let app = app().await;
    let (_, dune) = call(&app, Method::POST, "/books", Some(book("Dune", "SciFi", 1965, 2))).await;
    call(&app, Method::POST, "/books", Some(book("Emma", "Classics", 1815, 1))).await;
    let id = dune["id"].as_str().unwrap();

    let (_, scifi) = call(&app, Method::GET, "/books/category/SciFi", None).await;
    assert_eq!(scifi.as_array().unwrap().len(), 1);
    assert_eq!(scifi[0]["title"], "Dune");

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/books/{id}/category"),
        Some(json!({ "category": "Classics" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["category"], "Classics");
    assert_eq!(updated["availableCopies"], 2);

    let (_, classics) = call(&app, Method::GET, "/books/category/Classics", None).await;
    assert_eq!(classics.as_array().unwrap().len(), 2);
    let (_, scifi) = call(&app, Method::GET, "/books/category/SciFi", None).await;
    assert_eq!(scifi, json!([]));
}

#[tokio::test]
async fn errors_use_the_json_envelope() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Dune", "availableCopies": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"].as_array().unwrap().len() >= 3);
    assert!(body["error"]["timestamp"].is_string());

    let missing = uuid::Uuid::now_v7();
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/books/{missing}/copies"),
        Some(json!({ "change": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "Book not found");
}

#[tokio::test]
async fn ambient_endpoints_are_served() {
    let app = app().await;

    let (status, spec) = call(&app, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/books"].is_object());
    assert!(spec["paths"]["/books/{id}/copies"].is_object());

    let response = app
        .clone()
        .oneshot(HttpRequest::builder().uri("/books/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn module_can_run_over_a_prebuilt_service() {
    let service = BookCatalogService::new(Arc::new(MemoryBookRepository::new()));
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(BooksModule::with_service(service.clone())));
    let app = biblio_http::build_router(&registry, &Settings::default());

    let (status, created) =
        call(&app, Method::POST, "/books", Some(book("Emma", "Classics", 1815, 2))).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = service.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.to_string(), created["id"].as_str().unwrap());
}
