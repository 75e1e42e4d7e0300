use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{error::Result, types::isbn::Isbn};

/// What a search is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchQuery {
    Title(String),
    Isbn(Isbn),
}

impl Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchQuery::Title(title) => write!(f, "title \"{title}\""),
            SearchQuery::Isbn(isbn) => write!(f, "ISBN {isbn}"),
        }
    }
}

/// The title or ISBN captured for the one search in flight.
///
/// Owned by whoever drives the add-book flow and cleared once the book is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    title: Option<String>,
    isbn:  Option<Isbn>,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank titles clear the title.
    pub fn set_title(&mut self, title: &str) {
        let title = title.trim();
        self.title = (!title.is_empty()).then(|| title.to_string());
    }

    /// Scanned or typed ISBN, surrounding whitespace ignored.
    pub fn set_isbn(&mut self, isbn: &str) -> Result<()> {
        self.isbn = Some(Isbn::parse(isbn.trim())?);
        Ok(())
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn isbn(&self) -> Option<&Isbn> {
        self.isbn.as_ref()
    }

    /// The title wins when both are set.
    pub fn query(&self) -> Option<SearchQuery> {
        match (&self.title, &self.isbn) {
            (Some(title), _) => Some(SearchQuery::Title(title.clone())),
            (None, Some(isbn)) => Some(SearchQuery::Isbn(isbn.clone())),
            (None, None) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.isbn.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
