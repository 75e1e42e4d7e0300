use chrono::{DateTime, Utc};
use derives::Names;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::{Config, Styleable},
    error::{Result, ValidationErrors},
    lookup::secure_image_url,
    traits::DisplayTerminal,
    types::{
        isbn::{Isbn, INVALID_ISBN},
        lenient,
        library::Library,
        rating::Rating,
        status::{deserialize_status, ReadingStatus},
        timestamp::ReadingDate,
    },
};

fn opt_rating<'de, D>(d: D) -> std::result::Result<Option<Rating>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::opt_f64_or_string(d)?.map(Rating::clamped))
}

fn opt_reading_date<'de, D>(d: D) -> std::result::Result<Option<ReadingDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::opt_datetime(d)?.map(ReadingDate))
}

/// A book as stored by the backend.
#[derive(Names, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id:               String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub title:            String,
    /// Comma separated when there is more than one.
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub author:           String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub isbn:             String,
    #[serde(default, deserialize_with = "lenient::u32_or_string")]
    pub publication_year: u32,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub publisher:        String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub image_url:        String,
    #[serde(default, deserialize_with = "lenient::bool_or_string")]
    pub wishlist:         bool,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub library:          String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub description:      String,
    #[serde(
        rename = "lenguaje",
        default,
        deserialize_with = "lenient::string_or_null"
    )]
    pub language:         String,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub genre:            String,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status:           Option<ReadingStatus>,
    #[serde(
        rename = "totalPages",
        default,
        deserialize_with = "lenient::opt_u32_or_string"
    )]
    pub total_pages:      Option<u32>,
    #[serde(
        rename = "currentPage",
        default,
        deserialize_with = "lenient::opt_u32_or_string"
    )]
    pub current_page:     Option<u32>,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub notes:            String,
    #[serde(
        rename = "isFavorite",
        default,
        deserialize_with = "lenient::bool_or_string"
    )]
    pub is_favorite:      bool,
    #[serde(default, deserialize_with = "opt_rating")]
    pub rating:           Option<Rating>,
    #[serde(rename = "startDate", default, deserialize_with = "opt_reading_date")]
    pub start_date:       Option<ReadingDate>,
    #[serde(rename = "endDate", default, deserialize_with = "opt_reading_date")]
    pub end_date:         Option<ReadingDate>,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "lenient::opt_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at:       Option<DateTime<Utc>>,
    #[serde(
        rename = "updatedAt",
        default,
        deserialize_with = "lenient::opt_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at:       Option<DateTime<Utc>>,
}

impl Book {
    pub fn authors(&self) -> Vec<&str> {
        self.author
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .collect()
    }

    pub fn cover_url(&self) -> Option<String> {
        match self.image_url.trim() {
            "" => None,
            url => Some(secure_image_url(url)),
        }
    }

    pub fn is_read(&self) -> bool {
        self.status == Some(ReadingStatus::Completed)
    }

    pub fn is_reading(&self) -> bool {
        self.status == Some(ReadingStatus::Reading)
    }

    /// Multi-line rendering used by `show`.
    pub fn fmt_details(&self, config: &Config) -> String {
        let mut lines = vec![DisplayTerminal::fmt_to_string(self, config)];
        if !self.isbn.is_empty() {
            lines.push(match Isbn::parse(&self.isbn) {
                Ok(isbn) => config.output_isbn.format(&isbn, config),
                Err(_) => config.output_isbn.format_str(&self.isbn),
            });
        }
        if !self.publisher.is_empty() {
            lines.push(config.output_publisher.format_str(&self.publisher));
        }
        if self.publication_year > 0 {
            lines.push(config.output_release_date.format_str(self.publication_year));
        }
        if !self.language.is_empty() {
            lines.push(config.output_language.format_str(&self.language));
        }
        if !self.genre.is_empty() {
            lines.push(config.output_genre.format_str(&self.genre));
        }
        match (self.current_page, self.total_pages) {
            (Some(current), Some(total)) => lines.push(
                config
                    .output_page_count
                    .format_str(format!("{current}/{total}")),
            ),
            (None, Some(total)) => lines.push(config.output_page_count.format_str(total)),
            _ => {}
        }
        if let Some(start) = &self.start_date {
            lines.push(
                config
                    .output_started
                    .format_str(format!("{start} ({})", start.humanize())),
            );
        }
        if let Some(end) = &self.end_date {
            lines.push(
                config
                    .output_finished
                    .format_str(format!("{end} ({})", end.humanize())),
            );
        }
        if !self.notes.is_empty() {
            lines.push(config.output_notes.format_str(&self.notes));
        }
        if let Some(url) = self.cover_url() {
            lines.push(url.style(&config.output_id.style_content));
        }
        if !self.description.is_empty() {
            lines.push(String::new());
            lines.push(self.description.clone());
        }
        lines.join("\n")
    }
}

impl DisplayTerminal for Book {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        let title = match self.title.trim() {
            "" => "Untitled",
            title => title,
        };
        write!(f, "{}", title.style(&config.output_title.style_content))?;
        let authors = self.authors();
        if !authors.is_empty() {
            write!(f, " {}", config.output_author.format_vec(&authors))?;
        }
        if let Some(status) = &self.status {
            write!(f, " {}", config.output_status.format(status, config))?;
        }
        if let Some(rating) = &self.rating {
            write!(f, " {}", config.output_rating.format(rating, config))?;
        }
        if self.is_favorite {
            write!(f, " {}", "♥".style(&config.output_favorite.style_content))?;
        }
        write!(f, " {}", config.output_id.format_str(&self.id))
    }
}

/// The book entry form, filled by a lookup or by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookForm {
    pub title:            String,
    pub author:           String,
    pub isbn:             String,
    pub publisher:        String,
    pub publication_year: u32,
    pub language:         String,
    pub image_url:        String,
    pub description:      String,
    pub genre:            String,
}

impl BookForm {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Every problem with the form, so they can all be shown at once.
    pub fn errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.isbn.is_empty() {
            errors.push("isbn", "ISBN is required");
        } else if !Isbn::is_valid(&self.isbn) {
            errors.push("isbn", INVALID_ISBN);
        }
        errors
    }

    pub fn validate(&self) -> Result<()> {
        self.errors().into_result()
    }

    /// POST payload for a book on `library`'s shelf.
    pub fn into_new_book(self, library: &Library) -> Result<NewBook> {
        self.validate()?;
        Ok(NewBook {
            title:            self.title.trim().to_string(),
            author:           self.author.trim().to_string(),
            isbn:             self.isbn,
            publication_year: self.publication_year,
            publisher:        self.publisher,
            image_url:        self.image_url,
            description:      self.description,
            language:         self.language,
            genre:            self.genre,
            library:          library.id.clone(),
            wishlist:         library.wishlist,
            status:           library.wishlist.then_some(ReadingStatus::Wishlist),
        })
    }
}

impl DisplayTerminal for BookForm {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        let title = match self.title.trim() {
            "" => "Untitled",
            title => title,
        };
        write!(f, "{}", title.style(&config.output_title.style_content))?;
        let authors: Vec<&str> = self
            .author
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .collect();
        if !authors.is_empty() {
            write!(f, " {}", config.output_author.format_vec(&authors))?;
        }
        if self.publication_year > 0 {
            write!(f, " {}", config.output_release_date.format_str(self.publication_year))?;
        }
        if !self.isbn.is_empty() {
            write!(f, " {}", config.output_isbn.format_str(&self.isbn))?;
        }
        Ok(())
    }
}

/// Body of `POST /books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title:            String,
    pub author:           String,
    pub isbn:             String,
    pub publication_year: u32,
    pub publisher:        String,
    pub image_url:        String,
    pub description:      String,
    #[serde(rename = "lenguaje")]
    pub language:         String,
    pub genre:            String,
    pub library:          String,
    pub wishlist:         bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:           Option<ReadingStatus>,
}

impl NewBook {
    /// The record the backend is expected to store for this payload.
    pub fn into_book(self, id: impl Into<String>) -> Book {
        Book {
            id: id.into(),
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publication_year: self.publication_year,
            publisher: self.publisher,
            image_url: self.image_url,
            wishlist: self.wishlist,
            library: self.library,
            description: self.description,
            language: self.language,
            genre: self.genre,
            status: self.status,
            ..Book::default()
        }
    }
}

/// Body of `PATCH`/`PUT /books/{id}`. Fields left `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author:           Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn:             Option<String>,
    #[serde(
        rename = "publication_year",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher:        Option<String>,
    #[serde(rename = "image_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description:      Option<String>,
    #[serde(rename = "lenguaje", default, skip_serializing_if = "Option::is_none")]
    pub language:         Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:           Option<ReadingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages:      Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page:     Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite:      Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating:           Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date:       Option<ReadingDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date:         Option<ReadingDate>,
}

impl BookUpdate {
    /// The quick save on a book's detail view: rating plus reading dates.
    pub fn rating_only(
        rating: Rating,
        start_date: Option<ReadingDate>,
        end_date: Option<ReadingDate>,
    ) -> Self {
        Self {
            rating: Some(rating),
            start_date,
            end_date,
            ..Self::default()
        }
    }

    /// Every editable field of `book`, as sent by a full `PUT`.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title:            Some(book.title.clone()),
            author:           Some(book.author.clone()),
            isbn:             Some(book.isbn.clone()),
            publication_year: Some(book.publication_year),
            publisher:        Some(book.publisher.clone()),
            image_url:        Some(book.image_url.clone()),
            description:      Some(book.description.clone()),
            language:         Some(book.language.clone()),
            genre:            Some(book.genre.clone()),
            status:           book.status,
            total_pages:      book.total_pages,
            current_page:     book.current_page,
            notes:            Some(book.notes.clone()),
            is_favorite:      Some(book.is_favorite),
            rating:           book.rating,
            start_date:       book.start_date,
            end_date:         book.end_date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Checks the update against itself and, for fields it leaves out, against
    /// the stored `current` record.
    pub fn errors(&self, current: Option<&Book>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            errors.push("title", "Title is required");
        }
        if let Some(isbn) = &self.isbn {
            if !Isbn::is_valid(isbn) {
                errors.push("isbn", INVALID_ISBN);
            }
        }

        let status = self.status.or(current.and_then(|b| b.status));
        let start = self.start_date.or(current.and_then(|b| b.start_date));
        let end = self.end_date.or(current.and_then(|b| b.end_date));
        if let (Some(ReadingStatus::Completed), Some(start), Some(end)) = (status, start, end) {
            if end.date() < start.date() {
                errors.push("endDate", "End date must not be before the start date");
            }
        }

        let total = self.total_pages.or(current.and_then(|b| b.total_pages));
        let page = self.current_page.or(current.and_then(|b| b.current_page));
        if let (Some(total), Some(page)) = (total, page) {
            if page > total {
                errors.push(
                    "currentPage",
                    format!("Current page can't be past the last page ({total})"),
                );
            }
        }
        errors
    }

    pub fn validate(&self, current: Option<&Book>) -> Result<()> {
        self.errors(current).into_result()
    }

    /// Applies the fields that are set to `book`.
    pub fn apply(&self, book: &mut Book) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        set(&mut book.title, &self.title);
        set(&mut book.author, &self.author);
        set(&mut book.isbn, &self.isbn);
        set(&mut book.publication_year, &self.publication_year);
        set(&mut book.publisher, &self.publisher);
        set(&mut book.image_url, &self.image_url);
        set(&mut book.description, &self.description);
        set(&mut book.language, &self.language);
        set(&mut book.genre, &self.genre);
        set(&mut book.notes, &self.notes);
        set(&mut book.is_favorite, &self.is_favorite);
        if self.status.is_some() {
            book.status = self.status;
        }
        if self.total_pages.is_some() {
            book.total_pages = self.total_pages;
        }
        if self.current_page.is_some() {
            book.current_page = self.current_page;
        }
        if self.rating.is_some() {
            book.rating = self.rating;
        }
        if self.start_date.is_some() {
            book.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            book.end_date = self.end_date;
        }
    }
}
