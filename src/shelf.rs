use std::{fmt::Display, str::FromStr};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    types::{
        book::Book,
        library::{Library, Shelf},
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFilter {
    #[default]
    All,
    Favorites,
    Reading,
    Read,
}

impl BookFilter {
    pub const ALL: [BookFilter; 4] = [Self::All, Self::Favorites, Self::Reading, Self::Read];

    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Favorites => book.is_favorite,
            BookFilter::Reading => book.is_reading(),
            BookFilter::Read => book.is_read(),
        }
    }
}

impl FromStr for BookFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todos" => Ok(Self::All),
            "favorites" | "favourites" | "favoritos" => Ok(Self::Favorites),
            "reading" | "leyendo" => Ok(Self::Reading),
            "read" | "completed" | "leidos" => Ok(Self::Read),
            _ => Err(Error::validation(
                "filter",
                "Filter has to be one of all, favorites, reading or read",
            )),
        }
    }
}

impl Display for BookFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookFilter::All => "all",
            BookFilter::Favorites => "favorites",
            BookFilter::Reading => "reading",
            BookFilter::Read => "read",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShelfStats {
    pub total:     usize,
    pub favorites: usize,
    pub reading:   usize,
    pub read:      usize,
}

/// One library and its books, as fetched. Both shelves go through this view.
#[derive(Debug, Clone)]
pub struct ShelfView {
    library: Library,
    books:   Vec<Book>,
}

impl ShelfView {
    /// Orders by author, then title, ignoring case.
    pub fn new(library: Library, mut books: Vec<Book>) -> Self {
        books.sort_by_cached_key(|b| {
            (
                b.author.trim().to_lowercase(),
                b.title.trim().to_lowercase(),
            )
        });
        Self { library, books }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn shelf(&self) -> Shelf {
        self.library.shelf()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn filter(&self, filter: BookFilter) -> impl Iterator<Item = &Book> + '_ {
        self.books.iter().filter(move |b| filter.matches(b))
    }

    /// Books whose title or author contains `query`, ignoring case. A blank
    /// query matches everything.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Book> + 'a {
        let query = query.trim().to_lowercase();
        self.books.iter().filter(move |b| {
            b.title.to_lowercase().contains(&query) || b.author.to_lowercase().contains(&query)
        })
    }

    pub fn find(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn stats(&self) -> ShelfStats {
        ShelfStats {
            total:     self.books.len(),
            favorites: self.filter(BookFilter::Favorites).count(),
            reading:   self.filter(BookFilter::Reading).count(),
            read:      self.filter(BookFilter::Read).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
