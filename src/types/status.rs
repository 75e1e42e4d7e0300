use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::{Config, Styleable},
    error::{Error, Result},
    traits::{DisplayTerminal, PromptType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Reading,
    Completed,
    Wishlist,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [Self::Reading, Self::Completed, Self::Wishlist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Completed => "completed",
            Self::Wishlist => "wishlist",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reading" => Ok(Self::Reading),
            "completed" | "read" => Ok(Self::Completed),
            "wishlist" => Ok(Self::Wishlist),
            _ => Err(Error::validation(
                "status",
                "Status has to be one of reading, completed or wishlist",
            )),
        }
    }
}

impl Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reading => "Reading",
            Self::Completed => "Read",
            Self::Wishlist => "Wishlist",
        };
        write!(f, "{s}")
    }
}

impl DisplayTerminal for ReadingStatus {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result {
        use std::fmt::Write;
        write!(f, "{}", self.to_string().style(&config.output_status.style_content))
    }
}

/// Empty or unknown statuses stored by older app versions decode to `None`.
pub(crate) fn deserialize_status<'de, D>(d: D) -> std::result::Result<Option<ReadingStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.and_then(|s| s.parse().ok()))
}

impl PromptType for ReadingStatus {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self> {
        let cursor = initial_value
            .and_then(|x| Self::ALL.iter().position(|s| s == x))
            .unwrap_or(0);
        Ok(inquire::Select::new(prompt, Self::ALL.to_vec())
            .with_starting_cursor(cursor)
            .prompt()?)
    }

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>> {
        let cursor = initial_value
            .and_then(|x| Self::ALL.iter().position(|s| s == x))
            .unwrap_or(0);
        Ok(inquire::Select::new(prompt, Self::ALL.to_vec())
            .with_starting_cursor(cursor)
            .prompt_skippable()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "deserialize_status")]
        status: Option<ReadingStatus>,
    }

    #[test]
    fn parses_known_statuses() {
        assert_eq!("reading".parse::<ReadingStatus>().unwrap(), ReadingStatus::Reading);
        assert_eq!("Completed".parse::<ReadingStatus>().unwrap(), ReadingStatus::Completed);
        assert_eq!("read".parse::<ReadingStatus>().unwrap(), ReadingStatus::Completed);
        assert!("paused".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReadingStatus::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn blank_status_is_none() {
        let p: Wrapper = serde_json::from_str(r#"{"status": ""}"#).unwrap();
        assert_eq!(p.status, None);
        let p: Wrapper = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(p.status, None);
        let p: Wrapper = serde_json::from_str(r#"{"status": "wishlist"}"#).unwrap();
        assert_eq!(p.status, Some(ReadingStatus::Wishlist));
    }
}
