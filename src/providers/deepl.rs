use super::is_retryable;
use crate::error::{PreconditionError, ProviderError};
use crate::gateway::TranslationProvider;
use crate::i18n::LanguageCode;
use crate::model::{Failure, FailureKind, TranslatedText};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: &'a [String],
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Option<Vec<DeepLTranslation>>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepLError {
    message: Option<String>,
}

/// Free-tier keys end in `:fx` and must use the free API host.
pub fn default_base_url(api_key: &str) -> &'static str {
    if api_key.ends_with(":fx") {
        FREE_API_URL
    } else {
        PRO_API_URL
    }
}

pub struct DeepLProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl DeepLProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let base_url = default_base_url(&api_key).to_string();
        Self {
            client,
            api_key,
            base_url,
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn translate_url(&self) -> String {
        format!("{}/v2/translate", self.base_url.trim_end_matches('/'))
    }

    async fn call(&self, texts: &[String], language: &LanguageCode) -> Result<DeepLResponse, ProviderError> {
        let request = DeepLRequest {
            text: texts,
            target_lang: language.as_str(),
        };

        let response = self
            .client
            .post(self.translate_url())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            debug!("DeepL {} error body: {}", status, body);
            let message = serde_json::from_str::<DeepLError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &str {
        "DeepL"
    }

    fn ready(&self) -> Result<(), PreconditionError> {
        if self.api_key.trim().is_empty() {
            return Err(PreconditionError::MissingApiKey);
        }
        Ok(())
    }

    async fn translate_language(
        &self,
        texts: &[String],
        language: &LanguageCode,
    ) -> Result<Vec<TranslatedText>, ProviderError> {
        let response = with_retry_if(
            &self.retry,
            &format!("DeepL translation to {}", language),
            || self.call(texts, language),
            is_retryable,
        )
        .await?;

        let translations = response
            .translations
            .ok_or_else(|| ProviderError::Malformed("response has no translations".to_string()))?;

        Ok(translations
            .into_iter()
            .map(|t| match t.text {
                Some(text) => TranslatedText::Translated(text),
                None => TranslatedText::Failed(Failure::new(
                    FailureKind::Provider,
                    Some(language),
                    Some("no translation"),
                )),
            })
            .collect())
    }
}
