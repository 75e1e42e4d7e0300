use crate::config::Config;

/// Human readable names of a backend resource, used in log lines and errors.
pub trait Names {
    const NAME_SINGULAR: &'static str;
    const NAME_PLURAL: &'static str;
}

/// Values that can be entered interactively on the terminal.
pub trait PromptType {
    fn create_by_prompt(prompt: &str, initial_value: Option<&Self>) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn create_by_prompt_skippable(
        prompt: &str,
        initial_value: Option<&Self>,
    ) -> anyhow::Result<Option<Self>>
    where
        Self: Sized;

    fn update_by_prompt(&self, prompt: &str) -> anyhow::Result<Self>
    where
        Self: Sized,
    {
        Self::create_by_prompt(prompt, Some(self))
    }

    /// Skipping the prompt keeps the current value.
    fn update_by_prompt_skippable(s: &Option<Self>, prompt: &str) -> anyhow::Result<Option<Self>>
    where
        Self: Sized + Clone,
    {
        Ok(Self::create_by_prompt_skippable(prompt, s.as_ref())?.or_else(|| s.clone()))
    }
}

/// Styled terminal rendering driven by the output section of [Config].
pub trait DisplayTerminal {
    fn fmt(&self, f: &mut String, config: &Config) -> std::fmt::Result;

    fn fmt_to_string(&self, config: &Config) -> String {
        let mut s = String::new();
        // Writing into a String cannot fail.
        let _ = DisplayTerminal::fmt(self, &mut s, config);
        s
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Answers every prompt as if the user pressed Esc.
    #[derive(Debug, Clone, PartialEq)]
    struct Skipped(u8);

    impl PromptType for Skipped {
        fn create_by_prompt(_prompt: &str, _initial_value: Option<&Self>) -> anyhow::Result<Self> {
            anyhow::bail!("no terminal")
        }

        fn create_by_prompt_skippable(
            _prompt: &str,
            _initial_value: Option<&Self>,
        ) -> anyhow::Result<Option<Self>> {
            Ok(None)
        }
    }

    #[test]
    fn skipping_an_update_keeps_the_value() {
        assert_eq!(
            Skipped::update_by_prompt_skippable(&Some(Skipped(4)), "Rating:").unwrap(),
            Some(Skipped(4))
        );
        assert_eq!(Skipped::update_by_prompt_skippable(&None, "Rating:").unwrap(), None);
    }
}
