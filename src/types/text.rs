use serde::{Deserialize, Serialize};
use std::fmt::Display;

use inquire::validator::StringValidator;

use crate::traits::PromptType;

/// Free text entered on the terminal, never blank.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text(pub String);

impl Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Text> for String {
    fn from(value: Text) -> Self {
        value.0
    }
}

#[derive(Clone)]
struct ValidatorNonEmpty {}
impl StringValidator for ValidatorNonEmpty {
    fn validate(
        &self,
        input: &str,
    ) -> Result<inquire::validator::Validation, inquire::CustomUserError> {
        if input.trim().is_empty() {
            return Ok(inquire::validator::Validation::Invalid(
                "Empty string not allowed".into(),
            ));
        }
        Ok(inquire::validator::Validation::Valid)
    }
}

impl PromptType for Text {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self> {
        let mut prompt = inquire::Text::new(prompt).with_validator(ValidatorNonEmpty {});
        if let Some(s) = initial_value {
            prompt = prompt.with_initial_value(&s.0);
        }
        Ok(Text(prompt.prompt()?.trim().to_string()))
    }

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>> {
        let mut prompt = inquire::Text::new(prompt).with_validator(ValidatorNonEmpty {});
        if let Some(s) = initial_value {
            prompt = prompt.with_initial_value(&s.0);
        }
        match prompt.prompt_skippable()? {
            Some(text) => Ok(Some(Text(text.trim().to_string()))),
            None => Ok(None),
        }
    }
}
