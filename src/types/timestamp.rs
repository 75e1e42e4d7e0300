use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_humanize::HumanTime;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    traits::PromptType,
};

/// Day a book was started or finished. Sent to the backend as an ISO-8601 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingDate(pub DateTime<Utc>);

impl ReadingDate {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight exists")))
    }

    /// Accepts anything `dateparser` understands: `2024-03-01`, `March 1, 2024`, RFC 3339...
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        dateparser::parse(input)
            .map(Self)
            .map_err(|_| Error::validation("date", format!("\"{input}\" is not a date")))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// "3 weeks ago" style description relative to now.
    pub fn humanize(&self) -> String {
        HumanTime::from(self.0).to_string()
    }
}

impl Display for ReadingDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y/%m/%d"))
    }
}

impl PromptType for ReadingDate {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self> {
        let mut prompt = inquire::DateSelect::new(prompt);
        if let Some(initial_value) = initial_value {
            prompt = prompt.with_starting_date(initial_value.date());
        }
        Ok(Self::from_date(prompt.prompt()?))
    }

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>> {
        let mut prompt = inquire::DateSelect::new(prompt);
        if let Some(initial_value) = initial_value {
            prompt = prompt.with_starting_date(initial_value.date());
        }
        Ok(prompt.prompt_skippable()?.map(Self::from_date))
    }
}
