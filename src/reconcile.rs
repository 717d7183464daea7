//! Shape validation of provider output.
//!
//! The provider answers with flat arrays; position is the only link back to
//! the units. Every language comes out with exactly one entry per unit, so
//! later stages can trust the shape and only look at the values.

use crate::error::ProviderError;
use crate::i18n::LanguageCode;
use crate::model::{
    Failure, FailureKind, ProviderResult, ReconciledEntry, ReconciledLanguageResult,
    TranslatedText, TranslationBatch, REASON_FORMAT_MISMATCH,
};
use tracing::{debug, warn};

/// Reconcile every requested language, in batch language order.
pub fn reconcile(batch: &TranslationBatch, raw: &ProviderResult) -> Vec<ReconciledLanguageResult> {
    batch
        .target_languages()
        .iter()
        .map(|language| reconcile_language(batch, raw, language))
        .collect()
}

pub fn reconcile_language(
    batch: &TranslationBatch,
    raw: &ProviderResult,
    language: &LanguageCode,
) -> ReconciledLanguageResult {
    let slots: Vec<TranslatedText> = match raw.get(language) {
        None => {
            warn!("{}: no provider outcome", language);
            fill(batch.len(), Failure::from_provider_error(&ProviderError::Missing, language))
        }
        Some(Err(error)) => fill(batch.len(), Failure::from_provider_error(error, language)),
        Some(Ok(slots)) if slots.len() != batch.len() => {
            warn!(
                "{}: expected {} slots, provider returned {}",
                language,
                batch.len(),
                slots.len()
            );
            fill(
                batch.len(),
                Failure::new(FailureKind::Format, Some(language), Some(REASON_FORMAT_MISMATCH)),
            )
        }
        Some(Ok(slots)) => {
            debug!("{}: {} slots match the batch", language, slots.len());
            slots.clone()
        }
    };

    let entries = batch
        .units()
        .iter()
        .zip(slots)
        .map(|(unit, text)| ReconciledEntry {
            id: unit.id.clone(),
            text,
        })
        .collect();

    ReconciledLanguageResult {
        language: language.clone(),
        entries,
    }
}

fn fill(len: usize, failure: Failure) -> Vec<TranslatedText> {
    vec![TranslatedText::Failed(failure); len]
}
