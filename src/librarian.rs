use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    client::MilibroClient,
    error::{Error, Result},
    lookup::{CaptureState, Lookup, LookupOutcome},
    session::SessionStore,
    shelf::ShelfView,
    traits::Names,
    types::{
        book::{Book, BookForm, BookUpdate},
        library::Shelf,
        user::{ProfileUpdate, Session, User},
    },
};

/// Everything an operation on the user's books needs: the backend client, the
/// stored session and the lookup settings.
pub struct Librarian<S> {
    client:  MilibroClient,
    store:   S,
    lookup:  Lookup,
    session: Option<Session>,
}

impl<S: SessionStore> Librarian<S> {
    pub fn new(client: MilibroClient, store: S, lookup: Lookup) -> Self {
        Self {
            client,
            store,
            lookup,
            session: None,
        }
    }

    pub fn client(&self) -> &MilibroClient {
        &self.client
    }

    /// Picks up the session saved by an earlier run, if any.
    pub async fn restore(&mut self) -> Result<Option<&Session>> {
        let session = self.store.load().await?;
        self.client
            .set_token(session.as_ref().map(|s| s.access_token.clone()))
            .await;
        self.session = session;
        Ok(self.session.as_ref())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&Session> {
        let session = self.client.login(email, password).await?;
        self.store.save(&session).await?;
        self.store.remember_email(email.trim()).await?;
        Ok(self.session.insert(session))
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.client.logout().await;
        self.store.clear().await?;
        self.session = None;
        Ok(())
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::AuthRequired)
    }

    pub fn user(&self) -> Result<&User> {
        Ok(&self.session()?.user)
    }

    pub async fn last_email(&self) -> Result<Option<String>> {
        self.store.last_email().await
    }

    /// A rejected token ends the session so the next command asks for a login.
    async fn expire_on_auth<T>(&mut self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(Error::AuthRequired)) && self.session.is_some() {
            warn!("token rejected, logging out");
            self.logout().await?;
        }
        result
    }

    /// Always fetched fresh from the backend.
    pub async fn shelf(&mut self, shelf: Shelf) -> Result<ShelfView> {
        let user_id = self.user()?.id.clone();
        let result = self.client.load_shelf(&user_id, shelf).await;
        let (library, books) = self.expire_on_auth(result).await?;
        Ok(ShelfView::new(library, books))
    }

    /// Looks a book up on both shelves.
    pub async fn find_book(&mut self, id: &str) -> Result<Book> {
        for shelf in [Shelf::Owned, Shelf::Wishlist] {
            if let Some(book) = self.shelf(shelf).await?.find(id) {
                return Ok(book.clone());
            }
        }
        Err(Error::NotFound {
            resource: Book::NAME_SINGULAR,
            id:       id.to_string(),
        })
    }

    pub async fn lookup(
        &mut self,
        capture: &CaptureState,
        cancel: &CancellationToken,
    ) -> Result<LookupOutcome> {
        let query = capture
            .query()
            .ok_or_else(|| Error::validation("query", "Enter a title or an ISBN"))?;
        let result = self.lookup.run(&self.client, &query, cancel).await;
        self.expire_on_auth(result).await
    }

    /// Validates and creates the book on `shelf`. The capture is cleared once
    /// the backend has accepted it.
    pub async fn save_new(
        &mut self,
        form: BookForm,
        shelf: Shelf,
        capture: &mut CaptureState,
    ) -> Result<Book> {
        form.validate()?;
        let user_id = self.user()?.id.clone();
        let result = async {
            let library = self.client.library(&user_id, shelf).await?;
            let payload = form.into_new_book(&library)?;
            self.client.create_book(&payload).await
        }
        .await;
        let book = self.expire_on_auth(result).await?;
        capture.clear();
        Ok(book)
    }

    /// Partial update, e.g. the rating and reading dates.
    pub async fn rate(&mut self, book: &Book, update: BookUpdate) -> Result<Book> {
        update.validate(Some(book))?;
        self.session()?;
        let result = self.client.patch_book(&book.id, &update).await;
        self.expire_on_auth(result).await
    }

    /// Full update from the edit form.
    pub async fn edit(&mut self, book: &Book, update: BookUpdate) -> Result<Book> {
        update.validate(Some(book))?;
        self.session()?;
        let result = self.client.put_book(&book.id, &update).await;
        self.expire_on_auth(result).await
    }

    pub async fn remove(&mut self, id: &str) -> Result<()> {
        self.session()?;
        let result = self.client.delete_book(id).await;
        self.expire_on_auth(result).await
    }

    /// Profile changes are kept with the local session; the backend has no
    /// endpoint for them.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<&User> {
        update.validate()?;
        let session = self.session.as_mut().ok_or(Error::AuthRequired)?;
        update.apply(&mut session.user);
        self.store.save(session).await?;
        info!(user = %session.user.id, "profile updated");
        Ok(&session.user)
    }

    pub async fn upload_avatar(&mut self, path: &Path) -> Result<String> {
        let user_id = self.user()?.id.clone();
        let result = self.client.upload_avatar_file(&user_id, path).await;
        let url = self.expire_on_auth(result).await?;
        if let Some(session) = self.session.as_mut() {
            session.user.image = url.clone();
            self.store.save(session).await?;
        }
        Ok(url)
    }
}
