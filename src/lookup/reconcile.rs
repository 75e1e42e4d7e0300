use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{
    book::BookForm,
    catalog::{Candidate, GoogleBooksVolume, OpenLibraryRecord, Provider, SearchBundle},
};

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern is valid"));

/// Providers in the order their results are preferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderOrder(pub Vec<Provider>);

impl Default for ProviderOrder {
    fn default() -> Self {
        Self(vec![Provider::OpenLibrary, Provider::GoogleBooks])
    }
}

impl ProviderOrder {
    /// Configured providers first, then any the configuration left out.
    pub fn iter(&self) -> impl Iterator<Item = Provider> + '_ {
        let missing = [Provider::OpenLibrary, Provider::GoogleBooks]
            .into_iter()
            .filter(|p| !self.0.contains(p));
        let mut seen = Vec::with_capacity(2);
        self.0
            .iter()
            .copied()
            .filter(move |p| {
                if seen.contains(p) {
                    false
                } else {
                    seen.push(*p);
                    true
                }
            })
            .chain(missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Single(Candidate),
    /// A title search matched several books; the user picks one.
    Choose(Vec<Candidate>),
    NotFound,
}

/// Takes the first provider in `order` that has anything; the others are ignored.
pub fn reconcile(mut bundle: SearchBundle, order: &ProviderOrder) -> Resolution {
    for provider in order.iter() {
        let mut candidates = bundle.take(provider);
        match candidates.len() {
            0 => continue,
            1 => return Resolution::Single(candidates.remove(0)),
            _ => return Resolution::Choose(candidates),
        }
    }
    Resolution::NotFound
}

/// Only the leading scheme is upgraded.
pub fn secure_image_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

fn year_of(date: Option<&str>) -> u32 {
    date.and_then(|d| YEAR_PATTERN.find(d))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn first_of(lists: [&[String]; 2]) -> String {
    lists
        .iter()
        .flat_map(|l| l.iter())
        .find(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}

fn map_google(v: &GoogleBooksVolume) -> BookForm {
    let isbns: Vec<&str> = v.isbn.as_ref().map(|x| x.to_vec()).unwrap_or_default();
    // ISBN-13 when there is one.
    let isbn = isbns
        .iter()
        .find(|x| x.len() >= 13)
        .or(isbns.first())
        .map(|x| x.to_string())
        .unwrap_or_default();
    BookForm {
        title: v.title.clone().unwrap_or_default(),
        author: v.authors.join(", "),
        isbn,
        publisher: v.publisher.clone().unwrap_or_default(),
        publication_year: year_of(v.published_date.as_deref()),
        language: v.language.clone().unwrap_or_default(),
        image_url: v
            .image_links
            .as_ref()
            .and_then(|x| x.best())
            .map(secure_image_url)
            .unwrap_or_default(),
        description: v.description.clone().unwrap_or_default(),
        genre: v.categories.first().cloned().unwrap_or_default(),
    }
}

fn map_open_library(r: &OpenLibraryRecord) -> BookForm {
    let isbn = r
        .isbn
        .as_ref()
        .map(|ids| first_of([ids.isbn_13.as_slice(), ids.isbn_10.as_slice()]))
        .unwrap_or_default();
    BookForm {
        title: r.title.clone().unwrap_or_default(),
        author: r.authors.join(", "),
        isbn,
        publisher: r.publisher.clone().unwrap_or_default(),
        publication_year: year_of(r.published_date.as_deref()),
        language: r.language.clone().unwrap_or_default(),
        image_url: r
            .image_links
            .as_ref()
            .and_then(|x| x.best())
            .map(secure_image_url)
            .unwrap_or_default(),
        description: String::new(),
        genre: r.categories.first().cloned().unwrap_or_default(),
    }
}

/// Fills a book form from one candidate. Missing text fields stay empty, a
/// missing year stays 0.
pub fn map_candidate(candidate: &Candidate) -> BookForm {
    match candidate {
        Candidate::GoogleBooks(v) => map_google(v),
        Candidate::OpenLibrary(r) => map_open_library(r),
    }
}
