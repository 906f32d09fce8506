//! Request handling policy for the books resource: filtering, the
//! authorization gate and the replace / merge rules.

use std::sync::Arc;

use bookshop_authz::AuthorizationPolicy;
use bookshop_http::error::AppError;
use thiserror::Error;

use super::models::{Book, BookFilter, BookId, BookInput, BookPatch};
use super::store::BookStore;

#[derive(Error, Debug)]
pub enum BookError {
    #[error("missing or invalid credential")]
    Unauthorized,

    #[error("book {0} not found")]
    NotFound(BookId),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::Unauthorized => AppError::unauthorized(message),
            BookError::NotFound(_) => AppError::not_found(message),
            BookError::Store(source) => AppError::Internal(source),
        }
    }
}

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
    policy: Arc<dyn AuthorizationPolicy>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        Self { store, policy }
    }

    pub async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, BookError> {
        let books: Vec<Book> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|book| filter.matches(book))
            .collect();

        tracing::debug!(
            author = ?filter.author,
            title = ?filter.title,
            count = books.len(),
            "listed books"
        );
        Ok(books)
    }

    pub async fn get(&self, id: BookId) -> Result<Book, BookError> {
        self.store.find(id).await?.ok_or(BookError::NotFound(id))
    }

    pub async fn create(
        &self,
        credential: Option<&str>,
        input: BookInput,
    ) -> Result<Book, BookError> {
        self.authorize(credential, "create")?;

        let book = self.store.insert(input).await?;
        tracing::info!(book_id = book.id, "book created");
        Ok(book)
    }

    /// Overwrite every mutable field, empty values included.
    pub async fn replace(
        &self,
        credential: Option<&str>,
        id: BookId,
        input: BookInput,
    ) -> Result<Book, BookError> {
        self.authorize(credential, "replace")?;

        let current = self.get(id).await?;
        let updated = current.replaced_with(&input);
        self.save(updated).await
    }

    /// Overwrite only the fields the patch sets to a non-empty value.
    pub async fn merge(
        &self,
        credential: Option<&str>,
        id: BookId,
        patch: BookPatch,
    ) -> Result<Book, BookError> {
        self.authorize(credential, "merge")?;

        let current = self.get(id).await?;
        let updated = current.merged_with(&patch);
        self.save(updated).await
    }

    pub async fn delete(&self, credential: Option<&str>, id: BookId) -> Result<(), BookError> {
        self.authorize(credential, "delete")?;

        self.get(id).await?;
        if !self.store.delete(id).await? {
            return Err(BookError::NotFound(id));
        }
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    /// Runs before any lookup so callers without a credential learn nothing about ids.
    fn authorize(&self, credential: Option<&str>, operation: &'static str) -> Result<(), BookError> {
        if self.policy.authorize(credential) {
            Ok(())
        } else {
            tracing::warn!(operation, "rejected unauthorized book operation");
            Err(BookError::Unauthorized)
        }
    }

    async fn save(&self, book: Book) -> Result<Book, BookError> {
        let id = book.id;
        if !self.store.update(book.clone()).await? {
            return Err(BookError::NotFound(id));
        }
        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }
}
