use std::path::PathBuf;

use crossterm::style::Stylize;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{default_colors::*, error::Result, lookup::ProviderOrder, traits::DisplayTerminal};

pub const CONFIG_FILE: &str = "milibro.toml";
pub const ENV_PREFIX: &str = "MILIBRO_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    bold:   bool,
    italic: bool,
    color:  crossterm::style::Color,
}

impl StyleConfig {
    fn style(&self, s: impl ToString) -> String {
        let mut s = s.to_string().with(self.color);
        if self.bold {
            s = s.bold();
        }
        if self.italic {
            s = s.italic();
        }
        s.to_string()
    }
}

pub trait Styleable {
    fn style(&self, c: &StyleConfig) -> String;
}

impl<T> Styleable for T
where
    T: ToString + std::fmt::Display,
{
    fn style(&self, c: &StyleConfig) -> String {
        c.style(self)
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color:  COLOR_WHITE,
            bold:   false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub prefix:            String,
    pub suffix:            String,
    pub description:       String,
    pub separator:         String,
    pub style_prefix:      StyleConfig,
    pub style_suffix:      StyleConfig,
    pub style_description: StyleConfig,
    pub style_separator:   StyleConfig,
    pub style_content:     StyleConfig,
}

impl OutputConfig {
    pub fn format(&self, content: &impl DisplayTerminal, config: &Config) -> String {
        let prefix = self.prefix.style(&self.style_prefix);
        let suffix = self.suffix.style(&self.style_suffix);
        let description = self.description.style(&self.style_description);
        let content = DisplayTerminal::fmt_to_string(content, config);
        format!("{prefix}{description} {content}{suffix}")
    }

    pub fn format_str(&self, content: impl ToString) -> String {
        let prefix = self.prefix.style(&self.style_prefix);
        let suffix = self.suffix.style(&self.style_suffix);
        let description = self.description.style(&self.style_description);
        let content = content.to_string().style(&self.style_content);
        format!("{prefix}{description} {content}{suffix}")
    }

    pub fn format_vec(&self, content: &[impl ToString]) -> String {
        let prefix = self.prefix.style(&self.style_prefix);
        let suffix = self.suffix.style(&self.style_suffix);
        let description = self.description.style(&self.style_description);
        let separator = self.separator.style(&self.style_separator);
        let mut s = format!("{prefix}{description} ");
        let mut i = content.iter().peekable();
        while let Some(x) = i.next() {
            s.push_str(&x.to_string().style(&self.style_content));
            if i.peek().is_some() {
                s.push_str(&separator);
            }
        }
        s.push_str(&suffix);
        s
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix:            "[".into(),
            suffix:            "]".into(),
            description:       "".into(),
            separator:         ", ".into(),
            style_prefix:      StyleConfig::default(),
            style_suffix:      StyleConfig::default(),
            style_description: StyleConfig {
                italic: true,
                ..StyleConfig::default()
            },
            style_separator:   StyleConfig::default(),
            style_content:     StyleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend_url:          String,
    pub session_database:     PathBuf,
    pub history_file:         PathBuf,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub provider_order:       ProviderOrder,
    pub scan_server_port:     u16,
    pub output_id:            OutputConfig,
    pub output_title:         OutputConfig,
    pub output_author:        OutputConfig,
    pub output_isbn:          OutputConfig,
    pub output_publisher:     OutputConfig,
    pub output_language:      OutputConfig,
    pub output_release_date:  OutputConfig,
    pub output_genre:         OutputConfig,
    pub output_status:        OutputConfig,
    pub output_rating:        OutputConfig,
    pub output_favorite:      OutputConfig,
    pub output_page_count:    OutputConfig,
    pub output_started:       OutputConfig,
    pub output_finished:      OutputConfig,
    pub output_notes:         OutputConfig,
    pub output_provider:      OutputConfig,
    pub output_error:         OutputConfig,
}

impl Config {
    pub fn default_as_string() -> anyhow::Result<String> {
        Ok(toml::to_string(&Self::default())?)
    }

    /// Defaults, then `milibro.toml`, then the file named by `MILIBRO_CONFIG`,
    /// then `MILIBRO_*` environment variables.
    pub fn read_config() -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE));
        if let Ok(path) = std::env::var(format!("{ENV_PREFIX}CONFIG")) {
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)).extract()?)
    }

    pub fn session_database_path(&self) -> PathBuf {
        shellexpand::path::tilde(&self.session_database).into_owned()
    }

    pub fn history_file_path(&self) -> PathBuf {
        shellexpand::path::tilde(&self.history_file).into_owned()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url:          "https://milibro-danniel-dev.vercel.app".into(),
            session_database:     PathBuf::from("~/.local/share/milibro/session.db"),
            history_file:         PathBuf::from("~/.local/share/milibro/history.txt"),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            provider_order:       ProviderOrder::default(),
            scan_server_port:     3000,
            output_id:            OutputConfig {
                prefix: "(".into(),
                suffix: ")".into(),
                style_content: StyleConfig {
                    color: COLOR_DIMMED,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_title:         OutputConfig {
                prefix: "".into(),
                suffix: "".into(),
                style_content: StyleConfig {
                    color: COLOR_BOOK,
                    bold: true,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_author:        OutputConfig {
                description: "Written by:".into(),
                separator: " and ".into(),
                style_content: StyleConfig {
                    color: COLOR_AUTHOR,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_isbn:          OutputConfig {
                description: "ISBN:".into(),
                style_content: StyleConfig {
                    color: COLOR_DIMMED,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_publisher:     OutputConfig {
                description: "Publisher:".into(),
                style_content: StyleConfig {
                    color: COLOR_PUBLISHER,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_language:      OutputConfig {
                description: "Written in:".into(),
                style_content: StyleConfig {
                    color: COLOR_LANGUAGE,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_release_date:  OutputConfig {
                description: "Released:".into(),
                ..OutputConfig::default()
            },
            output_genre:         OutputConfig {
                description: "Genre:".into(),
                style_content: StyleConfig {
                    color: COLOR_GENRE,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_status:        OutputConfig {
                style_content: StyleConfig {
                    color: COLOR_STATUS,
                    bold: true,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_rating:        OutputConfig {
                description: "Rating:".into(),
                style_content: StyleConfig {
                    color: COLOR_RATING,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_favorite:      OutputConfig {
                prefix: "".into(),
                suffix: "".into(),
                style_content: StyleConfig {
                    color: COLOR_FAVORITE,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_page_count:    OutputConfig {
                description: "Pages:".into(),
                style_content: StyleConfig {
                    color: COLOR_PAGE_COUNT,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_started:       OutputConfig {
                description: "Started:".into(),
                style_content: StyleConfig {
                    color: COLOR_TIMESTAMP,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_finished:      OutputConfig {
                description: "Finished:".into(),
                style_content: StyleConfig {
                    color: COLOR_TIMESTAMP,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_notes:         OutputConfig {
                description: "Notes:".into(),
                ..OutputConfig::default()
            },
            output_provider:      OutputConfig {
                description: "From".into(),
                style_content: StyleConfig {
                    color: COLOR_DIMMED,
                    italic: true,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
            output_error:         OutputConfig {
                description: "Error".into(),
                style_content: StyleConfig {
                    color: COLOR_ERROR,
                    ..StyleConfig::default()
                },
                ..OutputConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let s = Config::default_as_string().unwrap();
        let parsed: Config = toml::from_str(&s).unwrap();
        assert_eq!(parsed.backend_url, Config::default().backend_url);
        assert_eq!(parsed.provider_order, ProviderOrder::default());
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, r#"backend_url = "http://192.168.10.60:3000""#)?;
            jail.set_env("MILIBRO_REQUEST_TIMEOUT_SECS", "5");
            let config = Config::read_config().map_err(|e| e.to_string())?;
            assert_eq!(config.backend_url, "http://192.168.10.60:3000");
            assert_eq!(config.request_timeout_secs, 5);
            assert_eq!(config.scan_server_port, 3000);
            Ok(())
        });
    }
}
