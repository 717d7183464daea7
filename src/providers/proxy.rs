use crate::error::{PreconditionError, ProviderError};
use crate::gateway::TranslationProvider;
use crate::i18n::LanguageCode;
use crate::model::TranslatedText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Placeholder left in unconfigured deployments.
pub const PLACEHOLDER_ENDPOINT: &str = "YOUR_DEPLOYMENT_URL";

const ERROR_BODY_PREVIEW: usize = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    texts: &'a [String],
    target_languages: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ProxyError {
    error: Option<String>,
}

/// Check that the endpoint is a usable http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<reqwest::Url, PreconditionError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(PreconditionError::EndpointNotConfigured(
            "endpoint is empty".to_string(),
        ));
    }
    if endpoint.contains(PLACEHOLDER_ENDPOINT) {
        return Err(PreconditionError::EndpointNotConfigured(format!(
            "replace {} with the proxy address",
            PLACEHOLDER_ENDPOINT
        )));
    }

    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| PreconditionError::EndpointNotConfigured(format!("{}: {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(PreconditionError::EndpointNotConfigured(format!(
            "unsupported scheme '{}'",
            scheme
        ))),
    }
}

/// Client for the translation proxy, one request per language.
pub struct ProxyProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ProxyProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Some(error) = serde_json::from_str::<ProxyError>(body).ok().and_then(|e| e.error) {
        return error;
    }
    let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW).collect();
    if preview.is_empty() {
        format!("Proxy error {}", status.as_u16())
    } else {
        preview
    }
}

fn decode_language(body: &str, language: &LanguageCode) -> Result<Vec<TranslatedText>, ProviderError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProviderError::Malformed("response is not an object".to_string()))?;

    let slots = match object.get(language.as_str()) {
        Some(Value::Array(slots)) => slots,
        Some(_) => {
            return Err(ProviderError::Malformed(format!(
                "{} entry is not an array",
                language
            )))
        }
        None => return Err(ProviderError::Missing),
    };

    slots
        .iter()
        .map(|slot| match slot {
            Value::String(text) => Ok(TranslatedText::from_wire(text.as_str())),
            _ => Err(ProviderError::Malformed(format!(
                "{} entry holds a non-string slot",
                language
            ))),
        })
        .collect()
}

#[async_trait]
impl TranslationProvider for ProxyProvider {
    fn name(&self) -> &str {
        "proxy"
    }

    fn ready(&self) -> Result<(), PreconditionError> {
        validate_endpoint(&self.endpoint).map(|_| ())
    }

    async fn translate_language(
        &self,
        texts: &[String],
        language: &LanguageCode,
    ) -> Result<Vec<TranslatedText>, ProviderError> {
        let request = ProxyRequest {
            texts,
            target_languages: [language.as_str()],
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
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
            debug!("Proxy {} error body: {}", status, body);
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status, &body),
            });
        }

        decode_language(&body, language)
    }
}
