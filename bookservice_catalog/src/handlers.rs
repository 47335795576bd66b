use std::sync::Arc;

use actix_web::web::{Bytes, Data};
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};
use serde::de::DeserializeOwned;

use crate::api::{
    BookFilter, BookResponse, CreateBookRequest, GetAllBooksResponse, Isbn, MessageResponse,
    UpdateBookRequest,
};
use crate::books_repository::BookRepository;
use crate::error::ApiError;
use crate::validator::{normalize_integers, validate, SchemaKind, ValidationResult};

/// Parses the raw body, checks it against the schema and only then converts it to the request type
fn parse_validated_body<T: DeserializeOwned>(
    body: &[u8],
    schema: SchemaKind,
) -> Result<T, ApiError> {
    // An empty body is checked as `{}`
    let mut payload: serde_json::Value = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(body).map_err(|err| {
            ApiError::Validation(vec![format!("instance is not valid JSON: {}", err)])
        })?
    };

    if let ValidationResult::Invalid(errors) = validate(&payload, schema) {
        return Err(ApiError::Validation(errors));
    }
    normalize_integers(&mut payload);

    serde_json::from_value(payload)
        .map_err(|err| ApiError::BadRequest(format!("Failed to read book: {}", err)))
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn list_books(
    books_repository: Data<Arc<dyn BookRepository>>,
    filter: web::Query<BookFilter>,
) -> Result<HttpResponse, Error> {
    let books = books_repository
        .list_books(&filter.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(GetAllBooksResponse { books }))
}

#[api_v2_operation]
pub async fn get_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    isbn: web::Path<Isbn>,
) -> Result<HttpResponse, Error> {
    let book = books_repository
        .get_book(&isbn.into_inner())
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(BookResponse { book }))
}

#[api_v2_operation]
pub async fn add_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    body: Bytes,
) -> Result<HttpResponse, Error> {
    let request: CreateBookRequest = parse_validated_body(&body, SchemaKind::Create)?;
    let book = books_repository
        .add_book(request.book)
        .await
        .map_err(ApiError::from)?;
    tracing::info!("Added book {}", book.isbn);
    Ok(HttpResponse::Created().json(BookResponse { book }))
}

#[api_v2_operation]
pub async fn update_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    isbn: web::Path<Isbn>,
    body: Bytes,
) -> Result<HttpResponse, Error> {
    let request: UpdateBookRequest = parse_validated_body(&body, SchemaKind::Update)?;
    let book = books_repository
        .update_book(&isbn.into_inner(), request.book)
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(BookResponse { book }))
}

#[api_v2_operation]
pub async fn remove_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    isbn: web::Path<Isbn>,
) -> Result<HttpResponse, Error> {
    let isbn = isbn.into_inner();
    books_repository
        .remove_book(&isbn)
        .await
        .map_err(ApiError::from)?;
    tracing::info!("Removed book {}", isbn);
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}
