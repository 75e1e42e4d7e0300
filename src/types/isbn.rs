use std::fmt::Display;

use inquire::{validator::Validation, CustomUserError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, Styleable},
    error::{Error, Result},
    traits::{DisplayTerminal, PromptType},
};

static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9-]{10,13}$").expect("ISBN pattern is valid"));

pub const INVALID_ISBN: &str = "ISBN must be 10 to 13 digits or hyphens";

/// An ISBN as typed or scanned: 10 to 13 characters, digits and hyphens only.
///
/// The checksum is not enforced, the backend accepts anything of that shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(input: &str) -> Result<Self> {
        if Self::is_valid(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(Error::validation("isbn", INVALID_ISBN))
        }
    }

    pub fn is_valid(input: &str) -> bool {
        ISBN_PATTERN.is_match(input)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digits(&self) -> String {
        self.0.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Hyphenated by registration group when the checksum is valid, unchanged otherwise.
    pub fn hyphenated(&self) -> String {
        match self.digits().parse::<isbn2::Isbn>() {
            Ok(isbn) => match isbn.hyphenate() {
                Ok(s) => s.to_string(),
                Err(_) => self.0.clone(),
            },
            Err(_) => self.0.clone(),
        }
    }
}

impl TryFrom<String> for Isbn {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(value: Isbn) -> Self {
        value.0
    }
}

impl Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DisplayTerminal for Isbn {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        write!(f, "{}", self.hyphenated().style(&config.output_isbn.style_content))
    }
}

pub(crate) fn validator_isbn(input: &str) -> std::result::Result<Validation, CustomUserError> {
    if Isbn::is_valid(input) {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid(inquire::validator::ErrorMessage::Custom(
            INVALID_ISBN.to_string(),
        )))
    }
}

impl PromptType for Isbn {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self> {
        let mut prompt = inquire::Text::new(prompt).with_validator(validator_isbn);
        if let Some(initial_value) = initial_value {
            prompt = prompt.with_initial_value(&initial_value.0);
        }
        Ok(Self::parse(&prompt.prompt()?)?)
    }

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>> {
        let mut prompt = inquire::Text::new(prompt).with_validator(validator_isbn);
        if let Some(initial_value) = initial_value {
            prompt = prompt.with_initial_value(&initial_value.0);
        }
        match prompt.prompt_skippable()? {
            Some(s) => Ok(Some(Self::parse(&s)?)),
            None => Ok(None),
        }
    }
}
