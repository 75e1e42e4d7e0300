use std::{fmt::Display, str::FromStr};

use inquire::{validator::Validation, CustomUserError};
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, Styleable},
    error::{Error, Result},
    traits::{DisplayTerminal, PromptType},
};

/// Personal rating on a 0-5 star scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "f64")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    /// Rejects anything outside 0-5. Used for user input.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::validation(
                "rating",
                format!("Rating has to be between 0-{}", Self::MAX),
            ))
        }
    }

    /// Rounds and clamps into 0-5. Used for values already stored on the backend.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        Self(value.round().clamp(0.0, Self::MAX as f64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn stars(&self) -> String {
        let filled = self.0 as usize;
        format!(
            "{}{}",
            "★".repeat(filled),
            "☆".repeat(Self::MAX as usize - filled)
        )
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl From<f64> for Rating {
    fn from(value: f64) -> Self {
        Self::clamped(value)
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().parse::<i64>() {
            Ok(n) => Self::new(n),
            Err(_) => Err(Error::validation("rating", "Input isn't a valid number")),
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

impl DisplayTerminal for Rating {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        write!(f, "{}", self.stars().style(&config.output_rating.style_content))
    }
}

fn validator(input: &str) -> std::result::Result<Validation, CustomUserError> {
    match input.parse::<Rating>() {
        Ok(_) => Ok(Validation::Valid),
        Err(Error::Validation(errors)) => Ok(Validation::Invalid(
            inquire::validator::ErrorMessage::Custom(
                errors.for_field("rating").join(", "),
            ),
        )),
        Err(e) => Err(Box::new(e)),
    }
}

impl PromptType for Rating {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self> {
        let mut prompt = inquire::Text::new(prompt).with_validator(validator);
        let initial_value = initial_value.map(|x| x.0.to_string());
        if let Some(s) = &initial_value {
            prompt = prompt.with_initial_value(s);
        }
        Ok(prompt.prompt()?.parse::<Rating>()?)
    }

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>> {
        let mut prompt = inquire::Text::new(prompt).with_validator(validator);
        let initial_value = initial_value.map(|x| x.0.to_string());
        if let Some(s) = &initial_value {
            prompt = prompt.with_initial_value(s);
        }
        match prompt.prompt_skippable()? {
            Some(s) => Ok(Some(s.parse::<Rating>()?)),
            None => Ok(None),
        }
    }
}
