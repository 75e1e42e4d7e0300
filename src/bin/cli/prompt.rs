use std::borrow::Cow;

use reedline::{Prompt, PromptEditMode, PromptHistorySearchStatus, PromptViMode};

#[derive(Default)]
pub struct MilibroPrompt {
    pub user: Option<String>,
}

impl Prompt for MilibroPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        match &self.user {
            Some(user) => Cow::Owned(format!("milibro ({user}) ")),
            None => Cow::Borrowed("milibro "),
        }
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, prompt_mode: PromptEditMode) -> Cow<str> {
        match prompt_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                PromptViMode::Normal => "> ".into(),
                PromptViMode::Insert => ": ".into(),
            },
            PromptEditMode::Custom(str) => format!("({str})").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed(":> ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: reedline::PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_the_user() {
        let mut prompt = MilibroPrompt::default();
        assert_eq!(prompt.render_prompt_left(), "milibro ");
        prompt.user = Some("Ana".into());
        assert_eq!(prompt.render_prompt_left(), "milibro (Ana) ");
    }
}
