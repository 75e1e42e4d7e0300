//! Candidate records from the two upstream catalogs, as relayed by the backend's
//! search endpoints.

use std::fmt::Display;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    config::{Config, Styleable},
    traits::DisplayTerminal,
    types::lenient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GoogleBooks,
    OpenLibrary,
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GoogleBooks => write!(f, "Google Books"),
            Provider::OpenLibrary => write!(f, "Open Library"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub small_thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub thumbnail:       Option<String>,
}

impl ImageLinks {
    pub fn best(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .or(self.small_thumbnail.as_deref())
    }
}

/// Google Books reports either one ISBN or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn isbn_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strings or bare numbers, alone or in a list. Anything else is `None`.
fn opt_one_or_many<'de, D>(d: D) -> Result<Option<OneOrMany>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => {
            let items: Vec<String> = items.into_iter().filter_map(isbn_text).collect();
            (!items.is_empty()).then_some(OneOrMany::Many(items))
        }
        other => isbn_text(other).map(OneOrMany::One),
    })
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(s) => vec![s.as_str()],
            OneOrMany::Many(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBooksVolume {
    #[serde(default, deserialize_with = "opt_one_or_many")]
    pub isbn:           Option<OneOrMany>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub title:          Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub published_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub description:    Option<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub authors:        Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub categories:     Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub image_links:    Option<ImageLinks>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub publisher:      Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub language:       Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32_or_string")]
    pub pages:          Option<u32>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub info_link:      Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLibraryIdentifiers {
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub isbn_10:     Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub isbn_13:     Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub openlibrary: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLibraryRecord {
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub isbn:           Option<OpenLibraryIdentifiers>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub title:          Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub published_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub authors:        Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_or_vec")]
    pub categories:     Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub image_links:    Option<ImageLinks>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub publisher:      Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub language:       Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32_or_string")]
    pub pages:          Option<u32>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub info_link:      Option<String>,
}

/// What one provider contributed to a search: nothing, one record, or a list
/// (title searches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProviderResult<T> {
    Empty,
    One(T),
    Many(Vec<T>),
}

impl<T> Default for ProviderResult<T> {
    fn default() -> Self {
        ProviderResult::Empty
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn decode<T: DeserializeOwned>(value: Value, provider: Provider) -> Option<T> {
    match serde_path_to_error::deserialize(value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(%provider, path = %e.path(), error = %e.inner(), "skipping unreadable record");
            None
        }
    }
}

impl<T: DeserializeOwned> ProviderResult<T> {
    /// `null`, `{}` and `[]` all mean the provider had nothing, the backend is
    /// not consistent about which one it sends. Records that don't decode are
    /// dropped, they never spoil the other provider's results.
    pub fn from_value(value: Value, provider: Provider) -> Self {
        if is_blank(&value) {
            return ProviderResult::Empty;
        }
        match value {
            Value::Array(items) => {
                let items: Vec<T> = items
                    .into_iter()
                    .filter(|x| !is_blank(x))
                    .filter_map(|x| decode(x, provider))
                    .collect();
                match items.len() {
                    0 => ProviderResult::Empty,
                    _ => ProviderResult::Many(items),
                }
            }
            other => decode(other, provider).map_or(ProviderResult::Empty, ProviderResult::One),
        }
    }
}

impl<T> ProviderResult<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, ProviderResult::Empty)
    }

    pub fn len(&self) -> usize {
        match self {
            ProviderResult::Empty => 0,
            ProviderResult::One(_) => 1,
            ProviderResult::Many(v) => v.len(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            ProviderResult::Empty => vec![],
            ProviderResult::One(x) => vec![x],
            ProviderResult::Many(v) => v,
        }
    }
}

fn google_books<'de, D>(d: D) -> Result<ProviderResult<GoogleBooksVolume>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ProviderResult::from_value(Value::deserialize(d)?, Provider::GoogleBooks))
}

fn open_library<'de, D>(d: D) -> Result<ProviderResult<OpenLibraryRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ProviderResult::from_value(Value::deserialize(d)?, Provider::OpenLibrary))
}

/// Response of both search endpoints: at most one result set per provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBundle {
    #[serde(default, deserialize_with = "google_books")]
    pub google_books: ProviderResult<GoogleBooksVolume>,
    #[serde(default, deserialize_with = "open_library")]
    pub open_library: ProviderResult<OpenLibraryRecord>,
}

impl SearchBundle {
    pub fn is_empty(&self) -> bool {
        self.google_books.is_empty() && self.open_library.is_empty()
    }

    /// Everything one provider returned, tagged with its origin.
    pub fn take(&mut self, provider: Provider) -> Vec<Candidate> {
        match provider {
            Provider::GoogleBooks => std::mem::take(&mut self.google_books)
                .into_vec()
                .into_iter()
                .map(Candidate::GoogleBooks)
                .collect(),
            Provider::OpenLibrary => std::mem::take(&mut self.open_library)
                .into_vec()
                .into_iter()
                .map(Candidate::OpenLibrary)
                .collect(),
        }
    }
}

/// A search result considered during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", content = "record", rename_all = "snake_case")]
pub enum Candidate {
    GoogleBooks(GoogleBooksVolume),
    OpenLibrary(OpenLibraryRecord),
}

impl Candidate {
    pub fn provider(&self) -> Provider {
        match self {
            Candidate::GoogleBooks(_) => Provider::GoogleBooks,
            Candidate::OpenLibrary(_) => Provider::OpenLibrary,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Candidate::GoogleBooks(x) => x.title.as_deref(),
            Candidate::OpenLibrary(x) => x.title.as_deref(),
        }
    }

    pub fn authors(&self) -> &[String] {
        match self {
            Candidate::GoogleBooks(x) => &x.authors,
            Candidate::OpenLibrary(x) => &x.authors,
        }
    }

    pub fn published_date(&self) -> Option<&str> {
        match self {
            Candidate::GoogleBooks(x) => x.published_date.as_deref(),
            Candidate::OpenLibrary(x) => x.published_date.as_deref(),
        }
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title().unwrap_or("Untitled"))?;
        if !self.authors().is_empty() {
            write!(f, " by {}", self.authors().join(", "))?;
        }
        if let Some(date) = self.published_date() {
            write!(f, " ({date})")?;
        }
        Ok(())
    }
}

impl DisplayTerminal for Candidate {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        write!(
            f,
            "{}",
            self.title()
                .unwrap_or("Untitled")
                .style(&config.output_title.style_content)
        )?;
        if !self.authors().is_empty() {
            write!(f, " {}", config.output_author.format_vec(self.authors()))?;
        }
        if let Some(date) = self.published_date() {
            write!(f, " {}", config.output_release_date.format_str(date))?;
        }
        write!(f, " {}", config.output_provider.format_str(self.provider()))
    }
}
