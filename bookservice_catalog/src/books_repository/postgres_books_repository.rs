use anyhow::Context;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row, Statement};

use crate::api::{Book, BookFilter, BookPatch};
use crate::books_repository::{BookRepository, BookRepositoryError};

const BOOK_COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

pub struct PostgresBooksRepository {
    client: Client,
}

pub struct PostgresBooksRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl PostgresBooksRepository {
    pub async fn init(config: PostgresBooksRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!(
            "Connecting to postgres at {} as {}",
            config.hostname,
            config.username
        );
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            isbn            TEXT PRIMARY KEY,
            amazon_url      TEXT NOT NULL,
            author          TEXT NOT NULL,
            language        TEXT NOT NULL,
            pages           INTEGER NOT NULL,
            publisher       TEXT NOT NULL,
            title           TEXT NOT NULL,
            year            INTEGER NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup table")?;
        Ok(Self { client })
    }
}

fn book_from_row(row: &Row) -> Result<Book, BookRepositoryError> {
    Ok(Book {
        isbn: row.try_get("isbn")?,
        amazon_url: row.try_get("amazon_url")?,
        author: row.try_get("author")?,
        language: row.try_get("language")?,
        pages: row.try_get("pages")?,
        publisher: row.try_get("publisher")?,
        title: row.try_get("title")?,
        year: row.try_get("year")?,
    })
}

/// Collects WHERE conditions together with their positional parameters
#[derive(Default)]
struct FilterConditions<'a> {
    conditions: Vec<String>,
    params: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> FilterConditions<'a> {
    fn push(&mut self, column: &str, operator: &str, value: &'a (dyn ToSql + Sync)) {
        self.params.push(value);
        self.conditions
            .push(format!("{} {} ${}", column, operator, self.params.len()));
    }

    fn push_if_some<T: ToSql + Sync + 'a>(
        &mut self,
        column: &str,
        operator: &str,
        value: &'a Option<T>,
    ) {
        if let Some(value) = value {
            self.push(column, operator, value);
        }
    }

    fn from_filter(filter: &'a BookFilter) -> Self {
        let mut conditions = Self::default();
        conditions.push_if_some("isbn", "=", &filter.isbn);
        conditions.push_if_some("amazon_url", "=", &filter.amazon_url);
        conditions.push_if_some("author", "=", &filter.author);
        conditions.push_if_some("language", "=", &filter.language);
        conditions.push_if_some("pages", "=", &filter.pages);
        conditions.push_if_some("publisher", "=", &filter.publisher);
        conditions.push_if_some("title", "=", &filter.title);
        conditions.push_if_some("year", "=", &filter.year);
        conditions.push_if_some("pages", ">=", &filter.min_pages);
        conditions.push_if_some("pages", "<=", &filter.max_pages);
        conditions.push_if_some("year", ">=", &filter.min_year);
        conditions.push_if_some("year", "<=", &filter.max_year);
        conditions
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BookRepositoryError> {
        let conditions = FilterConditions::from_filter(filter);
        let query = format!(
            "SELECT {} FROM books{}",
            BOOK_COLUMNS,
            conditions.where_clause()
        );
        tracing::debug!("Listing books with {}", query);

        let stmt: Statement = self.client.prepare(&query).await?;
        let rows = self.client.query(&stmt, &conditions.params).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn get_book(&self, isbn: &str) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!("SELECT {} FROM books WHERE isbn = ($1)", BOOK_COLUMNS))
            .await?;

        let rows = self.client.query(&stmt, &[&isbn]).await?;

        let row = rows
            .first()
            .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))?;
        book_from_row(row)
    }

    async fn add_book(&self, book: Book) -> Result<Book, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "INSERT INTO books ({0}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {0}",
                BOOK_COLUMNS
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &book.isbn,
                    &book.amazon_url,
                    &book.author,
                    &book.language,
                    &book.pages,
                    &book.publisher,
                    &book.title,
                    &book.year,
                ],
            )
            .await;

        match rows {
            Ok(rows) => book_from_row(rows.first().ok_or_else(|| {
                BookRepositoryError::Other("Inserted book not returned".to_string())
            })?),
            Err(err)
                if err
                    .as_db_error()
                    .map(|db_err| db_err.code() == &SqlState::UNIQUE_VIOLATION)
                    .unwrap_or_default() =>
            {
                Err(BookRepositoryError::AlreadyExists(book.isbn))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn update_book(&self, isbn: &str, patch: BookPatch) -> Result<Book, BookRepositoryError> {
        // Columns missing from the patch keep their stored value
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "UPDATE books SET
                    amazon_url = COALESCE($2, amazon_url),
                    author = COALESCE($3, author),
                    language = COALESCE($4, language),
                    pages = COALESCE($5, pages),
                    publisher = COALESCE($6, publisher),
                    title = COALESCE($7, title),
                    year = COALESCE($8, year)
                WHERE isbn = ($1) RETURNING {}",
                BOOK_COLUMNS
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &isbn,
                    &patch.amazon_url,
                    &patch.author,
                    &patch.language,
                    &patch.pages,
                    &patch.publisher,
                    &patch.title,
                    &patch.year,
                ],
            )
            .await?;

        let row = rows
            .first()
            .ok_or_else(|| BookRepositoryError::NotFound(isbn.to_string()))?;
        book_from_row(row)
    }

    async fn remove_book(&self, isbn: &str) -> Result<(), BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE isbn = ($1) RETURNING isbn")
            .await?;

        let rows = self.client.query(&stmt, &[&isbn]).await?;

        if rows.is_empty() {
            Err(BookRepositoryError::NotFound(isbn.to_string()))
        } else {
            Ok(())
        }
    }
}
