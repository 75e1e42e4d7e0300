use tracing::debug;

use super::{check_status, decode_json, MilibroClient};
use crate::{
    error::Result,
    traits::Names,
    types::{
        book::Book,
        library::{Library, Shelf},
    },
};

impl MilibroClient {
    /// `GET /library/{userId}/{wishlist}`
    pub async fn library(&self, user_id: &str, shelf: Shelf) -> Result<Library> {
        let url = self.endpoint(&format!(
            "/library/{}/{}",
            urlencoding::encode(user_id),
            shelf.is_wishlist()
        ));
        debug!(url = %url, %shelf, "fetching library");

        let response = self.send_authed(self.http.get(&url)).await?;
        let response = check_status(response, Library::NAME_SINGULAR, user_id).await?;
        decode_json(response, "library").await
    }

    /// `GET /books/{libraryId}`
    pub async fn books(&self, library_id: &str) -> Result<Vec<Book>> {
        let url = self.endpoint(&format!("/books/{}", urlencoding::encode(library_id)));
        debug!(url = %url, "fetching books");

        let response = self.send_authed(self.http.get(&url)).await?;
        let response = check_status(response, Library::NAME_SINGULAR, library_id).await?;
        let books: Vec<Book> = decode_json(response, "book list").await?;
        debug!(library = %library_id, "fetched {} {}", books.len(), Book::NAME_PLURAL);
        Ok(books)
    }

    /// The library for `shelf`, then its books. The second request needs the
    /// first one's id, so they run one after the other.
    pub async fn load_shelf(&self, user_id: &str, shelf: Shelf) -> Result<(Library, Vec<Book>)> {
        let library = self.library(user_id, shelf).await?;
        let books = self.books(&library.id).await?;
        Ok((library, books))
    }
}
