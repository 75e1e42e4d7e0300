use std::fmt::Display;

use anyhow::Result;
use inquire::{Confirm, CustomType, Password, Select};
use milibro::{
    config::Config,
    traits::{DisplayTerminal, PromptType},
    types::{
        book::{Book, BookForm, BookUpdate},
        catalog::Candidate,
        isbn::Isbn,
        rating::Rating,
        status::ReadingStatus,
        text::Text,
        timestamp::ReadingDate,
        user::{ProfileUpdate, User},
    },
};

fn text(prompt: &str, initial: &str) -> Result<String> {
    Ok(inquire::Text::new(prompt)
        .with_initial_value(initial)
        .prompt()?
        .trim()
        .to_string())
}

fn number(prompt: &str, initial: Option<u32>) -> Result<Option<u32>> {
    let mut prompt = CustomType::<u32>::new(prompt)
        .with_error_message("Please type a whole number")
        .with_help_message("Esc to leave empty");
    if let Some(initial) = initial {
        prompt = prompt.with_default(initial);
    }
    Ok(prompt.prompt_skippable()?)
}

struct Choice {
    index: usize,
    label: String,
}

impl Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Lets the user pick one of several search results. `None` means "none of these".
pub fn choose_candidate(candidates: &[Candidate], config: &Config) -> Result<Option<usize>> {
    let options = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| Choice {
            index,
            label: c.fmt_to_string(config),
        })
        .collect::<Vec<_>>();
    Ok(Select::new("Which one is it?", options)
        .with_help_message("Esc to fill the form by hand")
        .prompt_skippable()?
        .map(|c| c.index))
}

/// Walks through every field of the entry form, pre-filled with `form`.
pub fn review_form(form: BookForm) -> Result<BookForm> {
    let title = Text::create_by_prompt("Title:", Some(&Text(form.title.clone())))?;
    let author = text("Author(s), comma separated:", &form.author)?;
    let initial_isbn = Isbn::parse(&form.isbn).ok();
    let isbn = Isbn::create_by_prompt("ISBN:", initial_isbn.as_ref())?;
    let publisher = text("Publisher:", &form.publisher)?;
    let publication_year = number(
        "Publication year:",
        (form.publication_year > 0).then_some(form.publication_year),
    )?
    .unwrap_or(0);
    let language = text("Language:", &form.language)?;
    let genre = text("Genre:", &form.genre)?;
    let image_url = text("Cover URL:", &form.image_url)?;
    let description = match inquire::Editor::new("Description:")
        .with_predefined_text(&form.description)
        .prompt_skippable()?
    {
        Some(description) => description.trim().to_string(),
        None => form.description,
    };
    Ok(BookForm {
        title: title.into(),
        author,
        isbn: isbn.to_string(),
        publisher,
        publication_year,
        language,
        image_url,
        description,
        genre,
    })
}

/// The full edit form for a stored book.
pub fn edit_book(book: &Book) -> Result<BookUpdate> {
    let mut update = BookUpdate::from_book(book);
    update.status = ReadingStatus::update_by_prompt_skippable(&book.status, "Status:")?;
    update.total_pages = number("Total pages:", book.total_pages)?;
    update.current_page = number("Current page:", book.current_page)?;
    update.notes = Some(text("Notes:", &book.notes)?);
    update.is_favorite = Some(
        Confirm::new("Favorite?")
            .with_default(book.is_favorite)
            .prompt()?,
    );
    update.rating = Rating::update_by_prompt_skippable(&book.rating, "Rating (0-5):")?;
    update.start_date = ReadingDate::update_by_prompt_skippable(&book.start_date, "Started:")?;
    update.end_date = ReadingDate::update_by_prompt_skippable(&book.end_date, "Finished:")?;
    Ok(update)
}

pub fn login(last_email: Option<&str>) -> Result<(String, String)> {
    let mut prompt = inquire::Text::new("E-mail:");
    if let Some(email) = last_email {
        prompt = prompt.with_initial_value(email);
    }
    let email = prompt.prompt()?.trim().to_string();
    let password = Password::new("Password:")
        .without_confirmation()
        .prompt()?;
    Ok((email, password))
}

pub fn profile(user: &User) -> Result<ProfileUpdate> {
    let mut update = ProfileUpdate::from_user(user);
    update.name = text("Name:", &user.name)?;
    update.email = text("E-mail:", &user.email)?;
    Ok(update)
}

pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}

pub fn print_book(book: &Book, config: &Config) {
    println!("{}", book.fmt_to_string(config));
}
