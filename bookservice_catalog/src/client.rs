use anyhow::{bail, Context};
use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::api::{
    Book, BookFilter, BookPatch, BookResponse, CreateBookRequest, ErrorMessage, ErrorResponse,
    GetAllBooksResponse, UpdateBookRequest,
};

pub struct BookServiceCatalogClient {
    url: String,
    client: ClientWithMiddleware,
}

/// Turns an unexpected response into an error carrying the server's message
async fn failure(action: &str, response: Response) -> anyhow::Error {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(ErrorResponse {
            message: ErrorMessage::List(errors),
            ..
        }) => errors.join(", "),
        Ok(ErrorResponse {
            message: ErrorMessage::Single(message),
            ..
        }) => message,
        Err(_) => String::default(),
    };
    anyhow::anyhow!("Failed to {} ({}): {}", action, status, message)
}

impl BookServiceCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls GET /books endpoint with the filter as query parameters
    pub async fn list_books(&self, filter: &BookFilter) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/books", self.url))
            .query(filter)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(failure("list books", response).await);
        }
        let body: GetAllBooksResponse = response.json().await?;
        Ok(body.books)
    }

    /// Calls GET /books/{isbn} endpoint
    /// Returns None if the book is not in the catalog
    pub async fn get_book(&self, isbn: &str) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/books/{}", self.url, isbn))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            let body: BookResponse = response.json().await?;
            Ok(Some(body.book))
        } else {
            Err(failure("get book", response).await)
        }
    }

    /// Calls POST /books endpoint
    /// Returns the book as stored by the service
    pub async fn add_book(&self, book: Book) -> anyhow::Result<Book> {
        let response = self
            .client
            .post(format!("{}/books", self.url))
            .json(&CreateBookRequest { book })
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(failure("add book", response).await);
        }
        let body: BookResponse = response.json().await?;
        Ok(body.book)
    }

    /// Calls PUT /books/{isbn} endpoint
    /// Returns None if the book is not in the catalog
    pub async fn update_book(&self, isbn: &str, patch: BookPatch) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .put(format!("{}/books/{}", self.url, isbn))
            .json(&UpdateBookRequest { book: patch })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            let body: BookResponse = response.json().await?;
            Ok(Some(body.book))
        } else {
            Err(failure("update book", response).await)
        }
    }

    /// Calls DELETE /books/{isbn} endpoint
    /// Returns true if the book was removed and false if it was not in the catalog
    pub async fn remove_book(&self, isbn: &str) -> anyhow::Result<bool> {
        let response = self
            .client
            .delete(format!("{}/books/{}", self.url, isbn))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(failure("remove book", response).await),
        }
    }

    /// Calls GET /health endpoint
    pub async fn health(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.url))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Service is not healthy: {}", response.status())
        }
        Ok(())
    }
}
