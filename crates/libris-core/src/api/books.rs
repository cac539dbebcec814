//! Catalogue endpoints (`/books`).

use tracing::debug;

use crate::models::{Book, BookFilters};

use super::{ApiClient, ApiError, ApiRequest};

fn with_filters(request: ApiRequest, filters: &BookFilters) -> ApiRequest {
    request
        .query_opt("category", filters.category.as_deref())
        .query_opt("author", filters.author.as_deref())
        .query_opt("available", filters.available)
}

impl ApiClient {
    pub async fn fetch_books(&self, filters: &BookFilters) -> Result<Vec<Book>, ApiError> {
        let books: Vec<Book> = self.send(with_filters(ApiRequest::get("/books"), filters)).await?;
        debug!(count = books.len(), "Fetched books");
        Ok(books)
    }

    pub async fn fetch_book(&self, id: i64) -> Result<Book, ApiError> {
        self.get(&format!("/books/{}", id)).await
    }

    pub async fn search_books(&self, query: &str, filters: &BookFilters) -> Result<Vec<Book>, ApiError> {
        let request = ApiRequest::get("/books/search").query("query", query);
        self.send(with_filters(request, filters)).await
    }

    pub async fn fetch_available_books(&self) -> Result<Vec<Book>, ApiError> {
        self.get("/books/available").await
    }

    pub async fn fetch_books_by_category(&self, category: &str) -> Result<Vec<Book>, ApiError> {
        self.get(&format!("/books/category/{}", category)).await
    }

    pub async fn fetch_books_by_author(&self, author: &str) -> Result<Vec<Book>, ApiError> {
        self.get(&format!("/books/author/{}", author)).await
    }

    pub async fn create_book(&self, book: &Book) -> Result<Book, ApiError> {
        self.post("/books", book).await
    }

    pub async fn update_book(&self, id: i64, book: &Book) -> Result<Book, ApiError> {
        self.put(&format!("/books/{}", id), book).await
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/books/{}", id)).await
    }
}
