use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type Isbn = String;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// A single book of the catalog, identified by its isbn
pub struct Book {
    pub isbn: Isbn,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Partial update of a book. Fields left as None keep their stored value.
/// Isbn is not part of the patch, it can never be changed.
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Filters accepted by GET /books as query parameters.
/// Every present filter narrows the result, ranges are inclusive.
pub struct BookFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pages: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        fn equals<T: PartialEq>(filter: &Option<T>, value: &T) -> bool {
            filter.as_ref().map_or(true, |expected| expected == value)
        }

        equals(&self.isbn, &book.isbn)
            && equals(&self.amazon_url, &book.amazon_url)
            && equals(&self.author, &book.author)
            && equals(&self.language, &book.language)
            && equals(&self.pages, &book.pages)
            && equals(&self.publisher, &book.publisher)
            && equals(&self.title, &book.title)
            && equals(&self.year, &book.year)
            && self.min_pages.map_or(true, |min| book.pages >= min)
            && self.max_pages.map_or(true, |max| book.pages <= max)
            && self.min_year.map_or(true, |min| book.year >= min)
            && self.max_year.map_or(true, |max| book.year <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of POST /books
pub struct CreateBookRequest {
    pub book: Book,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of PUT /books/{isbn}
pub struct UpdateBookRequest {
    pub book: BookPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookResponse {
    pub book: Book,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct GetAllBooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum ErrorMessage {
    /// All validation errors of a rejected payload
    List(Vec<String>),
    Single(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Body of every failed request
pub struct ErrorResponse {
    pub message: ErrorMessage,
    pub status: u16,
}
