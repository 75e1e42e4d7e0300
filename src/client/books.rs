use tracing::{debug, info};

use super::{check_status, decode_json, MilibroClient};
use crate::{
    error::Result,
    lookup::CatalogSearch,
    traits::Names,
    types::{
        book::{Book, BookUpdate, NewBook},
        catalog::SearchBundle,
        isbn::Isbn,
        library::Library,
    },
};

impl MilibroClient {
    /// `POST /books`
    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let url = self.endpoint("/books");
        debug!(url = %url, title = %book.title, library = %book.library, "creating book");

        let response = self.send_authed(self.http.post(&url).json(book)).await?;
        let response = check_status(response, Library::NAME_SINGULAR, &book.library).await?;
        let created: Book = decode_json(response, "created book").await?;
        info!(id = %created.id, title = %created.title, "book created");
        Ok(created)
    }

    /// `PATCH /books/{id}`, only the fields set in `update`.
    pub async fn patch_book(&self, id: &str, update: &BookUpdate) -> Result<Book> {
        let url = self.endpoint(&format!("/books/{}", urlencoding::encode(id)));
        debug!(url = %url, "patching book");

        let response = self.send_authed(self.http.patch(&url).json(update)).await?;
        let response = check_status(response, Book::NAME_SINGULAR, id).await?;
        decode_json(response, "updated book").await
    }

    /// `PUT /books/{id}`
    pub async fn put_book(&self, id: &str, update: &BookUpdate) -> Result<Book> {
        let url = self.endpoint(&format!("/books/{}", urlencoding::encode(id)));
        debug!(url = %url, "replacing book");

        let response = self.send_authed(self.http.put(&url).json(update)).await?;
        let response = check_status(response, Book::NAME_SINGULAR, id).await?;
        decode_json(response, "updated book").await
    }

    /// `DELETE /books/{id}`
    pub async fn delete_book(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("/books/{}", urlencoding::encode(id)));
        debug!(url = %url, "deleting book");

        let response = self.send_authed(self.http.delete(&url)).await?;
        check_status(response, Book::NAME_SINGULAR, id).await?;
        info!(id = %id, "book deleted");
        Ok(())
    }
}

impl CatalogSearch for MilibroClient {
    /// `GET /books/search/{isbn}`
    async fn search_isbn(&self, isbn: &Isbn) -> Result<SearchBundle> {
        let url = self.endpoint(&format!(
            "/books/search/{}",
            urlencoding::encode(isbn.as_str())
        ));
        debug!(url = %url, isbn = %isbn, "searching by ISBN");

        let response = self.send_optional_auth(self.http.get(&url)).await?;
        let response = check_status(response, Book::NAME_SINGULAR, isbn.as_str()).await?;
        decode_json(response, "search results").await
    }

    /// `GET /books/search-title/{title}`
    async fn search_title(&self, title: &str) -> Result<SearchBundle> {
        let url = self.endpoint(&format!(
            "/books/search-title/{}",
            urlencoding::encode(title)
        ));
        debug!(url = %url, title = %title, "searching by title");

        let response = self.send_optional_auth(self.http.get(&url)).await?;
        let response = check_status(response, Book::NAME_SINGULAR, title).await?;
        decode_json(response, "search results").await
    }
}
