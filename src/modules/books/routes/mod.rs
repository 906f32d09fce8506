//! Axum handlers exposing [`BookService`] over HTTP.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use bookshop_http::{
    error::AppError,
    negotiate::{MediaFormat, Negotiated, Payload},
};

use super::models::{BookCollection, BookFilter, BookId, BookInput, BookPatch};
use super::service::BookService;

/// Routes relative to the module mount point (`/v1/books` by default).
pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book)
                .put(replace_book)
                .patch(merge_book)
                .delete(delete_book),
        )
        .with_state(service)
}

/// Raw `Authorization` header value; no scheme is stripped.
fn credential(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn list_books(
    State(service): State<BookService>,
    format: MediaFormat,
    Query(filter): Query<BookFilter>,
) -> Result<Response, AppError> {
    let books = service.list(&filter).await?;

    let response = match format {
        MediaFormat::Json => Negotiated::ok(format, books).into_response(),
        MediaFormat::Xml => Negotiated::ok(format, BookCollection { books }).into_response(),
    };
    Ok(response)
}

async fn get_book(
    State(service): State<BookService>,
    format: MediaFormat,
    Path(id): Path<BookId>,
) -> Result<Response, AppError> {
    let book = service.get(id).await?;
    Ok(Negotiated::ok(format, book).into_response())
}

async fn create_book(
    State(service): State<BookService>,
    format: MediaFormat,
    headers: HeaderMap,
    Payload(input): Payload<BookInput>,
) -> Result<Response, AppError> {
    let book = service.create(credential(&headers), input).await?;
    Ok(Negotiated::new(format, StatusCode::CREATED, book).into_response())
}

async fn replace_book(
    State(service): State<BookService>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
    Payload(input): Payload<BookInput>,
) -> Result<StatusCode, AppError> {
    service.replace(credential(&headers), id, input).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn merge_book(
    State(service): State<BookService>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
    Payload(patch): Payload<BookPatch>,
) -> Result<StatusCode, AppError> {
    service.merge(credential(&headers), id, patch).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn delete_book(
    State(service): State<BookService>,
    Path(id): Path<BookId>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    service.delete(credential(&headers), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
