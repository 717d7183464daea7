use crate::i18n::{parse_language_list, LanguageCode};
use crate::materialize::DEFAULT_FRAME_SPACING;
use crate::model::DEFAULT_DETAIL_LIMIT;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/translate";

#[derive(Debug, Clone)]
pub struct Config {
    // Plugin side: where the proxy lives
    pub translator_endpoint: String,
    pub translator_api_key: Option<String>,

    // Run settings
    pub target_languages: Vec<LanguageCode>,
    pub frame_spacing: f64,
    pub error_detail_limit: usize,

    // Proxy side: DeepL
    pub deepl_api_key: Option<String>,
    pub deepl_api_url: Option<String>,

    // Server
    pub port: u16,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translator_endpoint: DEFAULT_ENDPOINT.to_string(),
            translator_api_key: None,
            target_languages: LanguageCode::defaults(),
            frame_spacing: DEFAULT_FRAME_SPACING,
            error_detail_limit: DEFAULT_DETAIL_LIMIT,
            deepl_api_key: None,
            deepl_api_url: None,
            port: 3000,
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let target_languages = match non_empty_var("TARGET_LANGUAGES") {
            Some(list) => parse_language_list(&list).context("Invalid TARGET_LANGUAGES")?,
            None => defaults.target_languages,
        };

        Ok(Self {
            translator_endpoint: non_empty_var("TRANSLATOR_ENDPOINT")
                .unwrap_or(defaults.translator_endpoint),
            translator_api_key: non_empty_var("TRANSLATOR_API_KEY"),

            target_languages,
            frame_spacing: parsed_var("FRAME_SPACING")?.unwrap_or(defaults.frame_spacing),
            error_detail_limit: parsed_var("ERROR_DETAIL_LIMIT")?
                .unwrap_or(defaults.error_detail_limit),

            deepl_api_key: non_empty_var("DEEPL_API_KEY"),
            deepl_api_url: non_empty_var("DEEPL_API_URL"),

            port: parsed_var("PORT")?.unwrap_or(defaults.port),
            http_timeout_secs: parsed_var("HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout_secs),
        })
    }

    /// Shared HTTP client with the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    non_empty_var(name)
        .map(|v| v.parse::<T>().with_context(|| format!("Invalid {}: '{}'", name, v)))
        .transpose()
}
