//! Per-language fan-out to a translation provider.

use crate::error::{PreconditionError, ProviderError};
use crate::i18n::{LanguageCode, TranslationMetrics};
use crate::model::{truncate_detail, ProviderResult, TranslatedText, DEFAULT_DETAIL_LIMIT};
use crate::status::StatusSink;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A remote service that translates a whole batch into one language.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Check configuration before any call is made.
    fn ready(&self) -> Result<(), PreconditionError> {
        Ok(())
    }

    /// Translate every text into `language`, one slot per text.
    async fn translate_language(
        &self,
        texts: &[String],
        language: &LanguageCode,
    ) -> Result<Vec<TranslatedText>, ProviderError>;
}

#[async_trait]
impl<P: TranslationProvider + ?Sized> TranslationProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ready(&self) -> Result<(), PreconditionError> {
        (**self).ready()
    }

    async fn translate_language(
        &self,
        texts: &[String],
        language: &LanguageCode,
    ) -> Result<Vec<TranslatedText>, ProviderError> {
        (**self).translate_language(texts, language).await
    }
}

pub struct TranslationGateway<P> {
    provider: P,
    detail_limit: usize,
}

impl<P: TranslationProvider> TranslationGateway<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            detail_limit: DEFAULT_DETAIL_LIMIT,
        }
    }

    /// Bound on transport error detail kept per language.
    pub fn with_detail_limit(mut self, limit: usize) -> Self {
        self.detail_limit = limit;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Translate the batch into every language, one call per language.
    ///
    /// Calls run one after another in language order. A failing language
    /// never stops the others, and the result always holds an outcome for
    /// each requested language.
    pub async fn translate(
        &self,
        texts: &[String],
        languages: &[LanguageCode],
        status: &dyn StatusSink,
    ) -> ProviderResult {
        let mut result = ProviderResult::new();

        if texts.is_empty() {
            debug!("Empty batch; skipping {} provider calls", languages.len());
            for language in languages {
                result.insert(language.clone(), Ok(Vec::new()));
            }
            return result;
        }

        let metrics = TranslationMetrics::global();

        for language in languages {
            status.info(&format!("Translating to {}...", language));
            metrics.record_provider_call();

            let outcome = self
                .provider
                .translate_language(texts, language)
                .await
                .map_err(|e| self.bound_detail(e));

            match &outcome {
                Ok(slots) => {
                    info!(
                        "{}: {} returned {} of {} slots",
                        self.provider.name(),
                        language,
                        slots.len(),
                        texts.len()
                    );
                    status.info(&format!("{} translation received.", language));
                }
                Err(e) => {
                    metrics.record_provider_failure();
                    warn!("{}: {} failed: {}", self.provider.name(), language, e);
                    status.error(&format!("{} translation failed: {}", language, e));
                }
            }

            result.insert(language.clone(), outcome);
        }

        result
    }

    fn bound_detail(&self, error: ProviderError) -> ProviderError {
        match error {
            ProviderError::Transport(detail) => {
                ProviderError::Transport(truncate_detail(&detail, self.detail_limit))
            }
            other => other,
        }
    }
}
