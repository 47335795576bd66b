pub use in_memory_books_repository::InMemoryBookRepository;
pub use postgres_books_repository::{PostgresBooksRepository, PostgresBooksRepositoryConfig};

use crate::api::{Book, BookFilter, BookPatch, Isbn};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book {0} not found")]
    NotFound(Isbn),

    #[error("Book {0} already exists")]
    AlreadyExists(Isbn),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Lists books matching the filter, in storage order
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BookRepositoryError>;
    /// Retrieves a single book by its isbn
    async fn get_book(&self, isbn: &str) -> Result<Book, BookRepositoryError>;
    /// Adds book to repository, returns the book as it was stored
    async fn add_book(&self, book: Book) -> Result<Book, BookRepositoryError>;
    /// Merges the patch into the stored book, returns the book after the update
    async fn update_book(&self, isbn: &str, patch: BookPatch) -> Result<Book, BookRepositoryError>;
    /// Removes book from the repository
    async fn remove_book(&self, isbn: &str) -> Result<(), BookRepositoryError>;
}
