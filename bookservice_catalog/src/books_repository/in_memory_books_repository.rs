use serde_json::json;

use crate::api::{Book, BookFilter, BookPatch};
use crate::books_repository::{BookRepository, BookRepositoryError};

/// Keeps books in insertion order, which is the order they are listed in
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: parking_lot::RwLock<Vec<Book>>,
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .books
            .read()
            .iter()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect())
    }

    async fn get_book(&self, isbn: &str) -> Result<Book, BookRepositoryError> {
        self.books
            .read()
            .iter()
            .find(|book| book.isbn == isbn)
            .cloned()
            .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))
    }

    async fn add_book(&self, book: Book) -> Result<Book, BookRepositoryError> {
        let mut locked_books = self.books.write();
        if locked_books.iter().any(|stored| stored.isbn == book.isbn) {
            return Err(BookRepositoryError::AlreadyExists(book.isbn));
        }
        locked_books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, isbn: &str, patch: BookPatch) -> Result<Book, BookRepositoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .iter_mut()
            .find(|book| book.isbn == isbn)
            .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))?;

        let mut result_book = json!(book);
        json_patch::merge(&mut result_book, &json!(patch));
        let result_book: Book = serde_json::from_value(result_book)?;
        *book = result_book.clone();
        Ok(result_book)
    }

    async fn remove_book(&self, isbn: &str) -> Result<(), BookRepositoryError> {
        let mut locked_books = self.books.write();
        let position = locked_books
            .iter()
            .position(|book| book.isbn == isbn)
            .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))?;
        locked_books.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod in_memory_book_repository_tests {
    use crate::api::{Book, BookFilter, BookPatch};
    use crate::books_repository::{BookRepository, BookRepositoryError, InMemoryBookRepository};

    fn test_book(isbn: &str, author: &str, year: i32) -> Book {
        Book {
            isbn: isbn.to_string(),
            amazon_url: "http://a.co/eobPtX2".to_string(),
            author: author.to_string(),
            language: "english".to_string(),
            pages: 264,
            publisher: "Princeton University Press".to_string(),
            title: "Power-Up: Unlocking Hidden Math in Video Games".to_string(),
            year,
        }
    }

    #[tokio::test]
    /// Tests if add_book and get_book work correctly
    async fn test_add_book_and_get_it() {
        let repo = InMemoryBookRepository::default();

        let book_not_found = repo.get_book("0").await;
        assert!(matches!(
            book_not_found,
            Err(BookRepositoryError::NotFound(..))
        ));

        let book = test_book("0691161518", "Matthew Lane", 2017);
        let added = repo
            .add_book(book.clone())
            .await
            .expect("Failed to add book");
        assert_eq!(added, book);

        let returned = repo
            .get_book("0691161518")
            .await
            .expect("Failed to get book");
        assert_eq!(returned, book);

        let duplicate = repo.add_book(book.clone()).await;
        assert!(matches!(
            duplicate,
            Err(BookRepositoryError::AlreadyExists(..))
        ));
    }

    #[tokio::test]
    /// Tests if list_books keeps insertion order and applies filters
    async fn test_add_books_and_list_them() {
        let repo = InMemoryBookRepository::default();

        let list = repo
            .list_books(&BookFilter::default())
            .await
            .expect("Failed to list books");
        assert_eq!(list, vec![]);

        let book1 = test_book("1", "Author A", 1999);
        let book2 = test_book("2", "Author B", 2005);
        let book3 = test_book("3", "Author A", 2017);
        for book in [&book1, &book2, &book3] {
            repo.add_book(book.clone())
                .await
                .expect("Failed to add book");
        }

        let list = repo
            .list_books(&BookFilter::default())
            .await
            .expect("Failed to list books");
        assert_eq!(list, vec![book1.clone(), book2.clone(), book3.clone()]);

        let by_author = BookFilter {
            author: Some("Author A".to_string()),
            ..BookFilter::default()
        };
        let list = repo
            .list_books(&by_author)
            .await
            .expect("Failed to list books");
        assert_eq!(list, vec![book1.clone(), book3.clone()]);

        let by_author_and_years = BookFilter {
            min_year: Some(2000),
            ..by_author
        };
        let list = repo
            .list_books(&by_author_and_years)
            .await
            .expect("Failed to list books");
        assert_eq!(list, vec![book3]);
    }

    #[tokio::test]
    /// Tests if update_book merges only the given fields
    async fn test_add_book_patch_and_get_it() {
        let repo = InMemoryBookRepository::default();

        let result = repo.update_book("0", BookPatch::default()).await;
        assert!(matches!(result, Err(BookRepositoryError::NotFound(..))));

        let book = test_book("0691161518", "Matthew Lane", 2017);
        repo.add_book(book.clone())
            .await
            .expect("Failed to add book");

        let patch_title_only = BookPatch {
            title: Some("UPDATED BOOK".to_string()),
            ..BookPatch::default()
        };
        let updated = repo
            .update_book("0691161518", patch_title_only)
            .await
            .expect("Failed to patch");

        let expected_with_patch_title = Book {
            title: "UPDATED BOOK".to_string(),
            ..book.clone()
        };
        assert_eq!(updated, expected_with_patch_title);
        assert_eq!(
            repo.get_book("0691161518").await.unwrap(),
            expected_with_patch_title
        );

        let patch_all_fields = BookPatch {
            amazon_url: Some("https://taco.com".to_string()),
            author: Some("mctest".to_string()),
            language: Some("polish".to_string()),
            pages: Some(1000),
            publisher: Some("yeah right".to_string()),
            title: Some("amazing times".to_string()),
            year: Some(2000),
        };
        repo.update_book("0691161518", patch_all_fields)
            .await
            .expect("Failed to patch");

        let expected_after_patch = Book {
            isbn: "0691161518".to_string(),
            amazon_url: "https://taco.com".to_string(),
            author: "mctest".to_string(),
            language: "polish".to_string(),
            pages: 1000,
            publisher: "yeah right".to_string(),
            title: "amazing times".to_string(),
            year: 2000,
        };
        assert_eq!(
            repo.get_book("0691161518").await.unwrap(),
            expected_after_patch
        );
    }

    #[tokio::test]
    async fn test_remove_book() {
        let repo = InMemoryBookRepository::default();

        let result = repo.remove_book("0").await;
        assert!(matches!(result, Err(BookRepositoryError::NotFound(..))));

        repo.add_book(test_book("1", "Author A", 1999))
            .await
            .expect("Failed to add book");
        repo.add_book(test_book("2", "Author B", 2005))
            .await
            .expect("Failed to add book");

        repo.remove_book("1").await.expect("Failed to remove book");

        assert!(matches!(
            repo.get_book("1").await,
            Err(BookRepositoryError::NotFound(..))
        ));
        let list = repo
            .list_books(&BookFilter::default())
            .await
            .expect("Failed to list books");
        assert_eq!(list, vec![test_book("2", "Author B", 2005)]);
    }
}
