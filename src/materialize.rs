//! Builds one translated clone of the source frame per usable language.

use crate::document::{DesignDocument, FontDescriptor, FontLoader, NodeId, SourceFrame, TextUnit};
use crate::error::DocumentError;
use crate::i18n::{LanguageCode, TranslationMetrics};
use crate::model::{Failure, ReconciledLanguageResult, TranslatedText};
use crate::status::StatusSink;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Written into a unit whose fonts could not be loaded.
pub const FONT_FALLBACK_TEXT: &str = "[Font Err]";

/// Default horizontal gap between frames.
pub const DEFAULT_FRAME_SPACING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// No entries at all
    Empty,
    /// Every entry failed before reaching the document
    UpstreamFailure,
}

/// Why a language should not be materialized, if it should not.
///
/// A language with at least one entry that is translated or only failed
/// locally is kept; its sentinels are written verbatim.
pub fn suppression_reason(result: &ReconciledLanguageResult) -> Option<SuppressReason> {
    if result.is_empty() {
        Some(SuppressReason::Empty)
    } else if result.all_upstream_failures() {
        Some(SuppressReason::UpstreamFailure)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LanguageDisposition {
    Materialized {
        frame: NodeId,
        /// Units that received a translation
        applied: usize,
        /// Units that received a failure marker
        placeholders: usize,
    },
    Suppressed(SuppressReason),
    /// The clone's unit count differed from the original's
    Drifted { expected: usize, found: usize },
    /// A document operation failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageReport {
    pub language: LanguageCode,
    pub disposition: LanguageDisposition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializeReport {
    pub created: usize,
    pub languages: Vec<LanguageReport>,
}

impl MaterializeReport {
    pub fn disposition(&self, language: &LanguageCode) -> Option<&LanguageDisposition> {
        self.languages
            .iter()
            .find(|r| &r.language == language)
            .map(|r| &r.disposition)
    }
}

pub struct FrameMaterializer<'a, D: ?Sized, F: ?Sized> {
    document: &'a mut D,
    fonts: &'a F,
    status: &'a dyn StatusSink,
    frame_spacing: f64,
    font_cache: HashMap<FontDescriptor, bool>,
}

impl<'a, D, F> FrameMaterializer<'a, D, F>
where
    D: DesignDocument + ?Sized,
    F: FontLoader + ?Sized,
{
    pub fn new(document: &'a mut D, fonts: &'a F, status: &'a dyn StatusSink) -> Self {
        Self {
            document,
            fonts,
            status,
            frame_spacing: DEFAULT_FRAME_SPACING,
            font_cache: HashMap::new(),
        }
    }

    pub fn with_frame_spacing(mut self, spacing: f64) -> Self {
        self.frame_spacing = spacing;
        self
    }

    /// Create one clone per usable language and report what happened to
    /// each. Failures are contained to their language or unit.
    pub async fn materialize(
        &mut self,
        source: &SourceFrame,
        results: &[ReconciledLanguageResult],
    ) -> MaterializeReport {
        let metrics = TranslationMetrics::global();
        let mut report = MaterializeReport::default();

        self.status.info("Loading fonts...");
        self.preload_fonts(source).await;
        self.status.info("Fonts loaded. Creating frames...");

        for result in results {
            let disposition = match suppression_reason(result) {
                Some(reason) => {
                    warn!("{}: skipped ({:?})", result.language, reason);
                    metrics.record_language_suppressed();
                    LanguageDisposition::Suppressed(reason)
                }
                None => {
                    let placement = report.created + 1;
                    match self.build_clone(source, result, placement).await {
                        Ok(disposition) => disposition,
                        Err(e) => {
                            warn!("{}: document operation failed: {}", result.language, e);
                            LanguageDisposition::Failed(e.to_string())
                        }
                    }
                }
            };

            match &disposition {
                LanguageDisposition::Materialized { .. } => {
                    report.created += 1;
                    metrics.record_language_materialized();
                }
                LanguageDisposition::Drifted { .. } => metrics.record_clone_discarded(),
                _ => {}
            }

            report.languages.push(LanguageReport {
                language: result.language.clone(),
                disposition,
            });
        }

        report
    }

    async fn preload_fonts(&mut self, source: &SourceFrame) {
        let units = match self.document.text_units(&source.id) {
            Ok(units) => units,
            Err(e) => {
                warn!("Could not enumerate fonts of {}: {}", source.id, e);
                return;
            }
        };

        let mut fonts: Vec<FontDescriptor> = units.into_iter().flat_map(|u| u.fonts).collect();
        fonts.sort_by(|a, b| (&a.family, &a.style).cmp(&(&b.family, &b.style)));
        fonts.dedup();

        let loader = self.fonts;
        let outcomes = join_all(fonts.iter().map(|font| loader.ensure_loaded(font))).await;

        for (font, outcome) in fonts.into_iter().zip(outcomes) {
            if let Err(e) = &outcome {
                warn!("{}", e);
            }
            self.font_cache.insert(font, outcome.is_ok());
        }
        debug!("Preloaded {} fonts", self.font_cache.len());
    }

    async fn fonts_available(&mut self, fonts: &[FontDescriptor]) -> bool {
        let mut available = true;
        for font in fonts {
            let loaded = match self.font_cache.get(font) {
                Some(loaded) => *loaded,
                None => {
                    let loaded = self.fonts.ensure_loaded(font).await.is_ok();
                    self.font_cache.insert(font.clone(), loaded);
                    loaded
                }
            };
            available &= loaded;
        }
        available
    }

    async fn build_clone(
        &mut self,
        source: &SourceFrame,
        result: &ReconciledLanguageResult,
        placement: usize,
    ) -> Result<LanguageDisposition, DocumentError> {
        let clone = self.document.clone_container(&source.id)?;

        let clone_units = match self.document.text_units(&clone) {
            Ok(units) => units,
            Err(e) => {
                self.discard(&clone);
                return Err(e);
            }
        };

        if clone_units.len() != source.units.len() {
            warn!(
                "{}: clone has {} text units, original has {}; discarding",
                result.language,
                clone_units.len(),
                source.units.len()
            );
            self.discard(&clone);
            return Ok(LanguageDisposition::Drifted {
                expected: source.units.len(),
                found: clone_units.len(),
            });
        }

        match self
            .fill_clone(source, result, &clone, &clone_units, placement)
            .await {
            Ok((applied, placeholders)) => {
                info!(
                    "{}: created frame with {} translated and {} marked units",
                    result.language, applied, placeholders
                );
                Ok(LanguageDisposition::Materialized {
                    frame: clone,
                    applied,
                    placeholders,
                })
            }
            Err(e) => {
                self.discard(&clone);
                Err(e)
            }
        }
    }

    async fn fill_clone(
        &mut self,
        source: &SourceFrame,
        result: &ReconciledLanguageResult,
        clone: &NodeId,
        clone_units: &[TextUnit],
        placement: usize,
    ) -> Result<(usize, usize), DocumentError> {
        let texts: HashMap<&NodeId, &TranslatedText> =
            result.entries.iter().map(|e| (&e.id, &e.text)).collect();

        let mut applied = 0;
        let mut placeholders = 0;

        for (original, target) in source.units.iter().zip(clone_units) {
            let text = if !self.fonts_available(&target.fonts).await {
                placeholders += 1;
                FONT_FALLBACK_TEXT.to_string()
            } else {
                match texts.get(&original.id) {
                    Some(TranslatedText::Translated(text)) => {
                        applied += 1;
                        text.clone()
                    }
                    Some(TranslatedText::Failed(failure)) => {
                        placeholders += 1;
                        failure.sentinel().to_string()
                    }
                    None => {
                        placeholders += 1;
                        Failure::lookup_miss(&original.id).sentinel().to_string()
                    }
                }
            };
            self.document.set_text(&target.id, &text)?;
        }

        let name = format!("{} ({})", source.name, result.language);
        let offset = (source.geometry.width + self.frame_spacing) * placement as f64;
        self.document.set_name(clone, &name)?;
        self.document
            .set_position(clone, source.geometry.x + offset, source.geometry.y)?;
        self.document.attach(clone)?;

        Ok((applied, placeholders))
    }

    fn discard(&mut self, clone: &NodeId) {
        if let Err(e) = self.document.discard(clone) {
            warn!("Failed to discard clone {}: {}", clone, e);
        }
    }
}
