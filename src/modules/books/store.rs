use async_trait::async_trait;
use bookshop_db::MemoryTable;

use super::models::{Book, BookId, BookInput};

/// Primitive operations over the authoritative set of books.
///
/// Values are exchanged by copy: `find` hands out a snapshot and
/// `update` receives the complete new value.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book in the store's native order.
    async fn list(&self) -> anyhow::Result<Vec<Book>>;

    async fn find(&self, id: BookId) -> anyhow::Result<Option<Book>>;

    /// Insert a new book; the store assigns its id.
    async fn insert(&self, input: BookInput) -> anyhow::Result<Book>;

    /// Replace the stored book with the same id. `false` if it no longer exists.
    async fn update(&self, book: Book) -> anyhow::Result<bool>;

    /// `false` if no book had this id.
    async fn delete(&self, id: BookId) -> anyhow::Result<bool>;
}

/// Book store kept in process memory, ordered by id.
pub struct InMemoryBookStore {
    table: MemoryTable<Book>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("books"),
        }
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self) -> anyhow::Result<Vec<Book>> {
        Ok(self.table.all().await)
    }

    async fn find(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        Ok(self.table.get(id).await)
    }

    async fn insert(&self, input: BookInput) -> anyhow::Result<Book> {
        Ok(self
            .table
            .insert_with(|id| Book::from_input(id, input))
            .await)
    }

    async fn update(&self, book: Book) -> anyhow::Result<bool> {
        Ok(self.table.replace(book.id, book).await)
    }

    async fn delete(&self, id: BookId) -> anyhow::Result<bool> {
        Ok(self.table.remove(id).await.is_some())
    }
}
