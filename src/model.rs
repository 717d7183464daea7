//! Data carried between pipeline stages.
//!
//! Per-slot results use the tagged `TranslatedText` type. The bracketed
//! sentinel strings (`[Format Err ES: format-mismatch]`) exist only as the
//! rendering of a `Failure`: they are what ends up in a frame when a slot has
//! no usable translation, and what the proxy puts on the wire for clients
//! that only understand plain strings.

use crate::document::NodeId;
use crate::error::ProviderError;
use crate::i18n::LanguageCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Reason code for a language whose array length differs from the batch.
pub const REASON_FORMAT_MISMATCH: &str = "format-mismatch";

/// Reason code for a language the provider did not answer for.
pub const REASON_MISSING: &str = "missing";

/// Default bound on error detail copied into sentinels.
pub const DEFAULT_DETAIL_LIMIT: usize = 50;

/// A text-bearing unit of the source container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUnit {
    pub id: NodeId,
    pub source_text: String,
}

impl ContentUnit {
    pub fn new(id: impl Into<NodeId>, source_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_text: source_text.into(),
        }
    }
}

/// The ordered source texts of one run plus the languages to request.
///
/// Position is the only link between a source text and its translation, so
/// the units are never reordered, filtered or deduplicated.
#[derive(Debug, Clone)]
pub struct TranslationBatch {
    units: Vec<ContentUnit>,
    target_languages: Vec<LanguageCode>,
}

impl TranslationBatch {
    pub fn new(units: Vec<ContentUnit>, target_languages: Vec<LanguageCode>) -> Self {
        Self {
            units,
            target_languages,
        }
    }

    pub fn units(&self) -> &[ContentUnit] {
        &self.units
    }

    pub fn target_languages(&self) -> &[LanguageCode] {
        &self.target_languages
    }

    /// Source texts in unit order, as sent to the provider.
    pub fn source_texts(&self) -> Vec<String> {
        self.units.iter().map(|u| u.source_text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Provider returned an error status
    Provider,
    /// Provider could not be reached
    Network,
    /// Provider output did not have the expected shape
    Format,
    /// Provider output had no entry for the language
    Missing,
    /// Font resources for the unit could not be loaded
    Font,
    /// The unit's id had no entry in the reconciled result
    Lookup,
}

impl FailureKind {
    /// Label used in the sentinel text.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Provider => "Provider",
            FailureKind::Network => "Network",
            FailureKind::Format => "Format",
            FailureKind::Missing => "Missing",
            FailureKind::Font => "Font",
            FailureKind::Lookup => "Lookup",
        }
    }

    /// Failures raised before the document is touched. A language made only
    /// of these is never materialized.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            FailureKind::Provider | FailureKind::Network | FailureKind::Format | FailureKind::Missing
        )
    }

    /// Kind for a sentinel label, including the labels older clients and
    /// proxies wrote. Anything else is not a sentinel.
    fn from_label(label: &str) -> Option<Self> {
        let kind = match label {
            "Provider" | "DeepL API" | "Proxy Call" | "OpenAI" | "OpenAI API" => {
                FailureKind::Provider
            }
            "Network" | "Mini-Server Network" | "API/Network" => FailureKind::Network,
            "Format" | "DeepL Resp. Format" | "Proxy Format" => FailureKind::Format,
            "Missing" | "Proxy Data" => FailureKind::Missing,
            "Font" => FailureKind::Font,
            "Lookup" => FailureKind::Lookup,
            _ => return None,
        };
        Some(kind)
    }
}

/// A slot without a usable translation, with its rendered sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    sentinel: String,
}

impl Failure {
    /// Build a failure rendered as `[<Label> Err <LANG>: <detail>]`.
    pub fn new(kind: FailureKind, language: Option<&LanguageCode>, detail: Option<&str>) -> Self {
        let label = kind.label();
        // Brackets inside the detail would make the sentinel undecodable.
        let detail = detail.map(|d| d.replace('[', "(").replace(']', ")"));
        let sentinel = match (language, detail) {
            (Some(lang), Some(detail)) => format!("[{} Err {}: {}]", label, lang, detail),
            (Some(lang), None) => format!("[{} Err {}]", label, lang),
            (None, Some(detail)) => format!("[{} Err: {}]", label, detail),
            (None, None) => format!("[{} Err]", label),
        };
        Self { kind, sentinel }
    }

    /// Failure for a whole language whose provider call failed.
    pub fn from_provider_error(error: &ProviderError, language: &LanguageCode) -> Self {
        match error {
            ProviderError::Rejected { message, .. } => {
                Self::new(FailureKind::Provider, Some(language), Some(message.as_str()))
            }
            ProviderError::Transport(detail) => {
                Self::new(FailureKind::Network, Some(language), Some(detail.as_str()))
            }
            ProviderError::Malformed(detail) => {
                Self::new(FailureKind::Format, Some(language), Some(detail.as_str()))
            }
            ProviderError::Missing => {
                Self::new(FailureKind::Missing, Some(language), Some(REASON_MISSING))
            }
        }
    }

    /// Marker for a unit whose id has no reconciled entry.
    pub fn lookup_miss(id: &NodeId) -> Self {
        Self::new(FailureKind::Lookup, None, Some(id.as_str()))
    }

    /// Decode a sentinel string received over the wire.
    ///
    /// Recognises this crate's own sentinels as well as the older
    /// `[DeepL API Err: ...]` / `[Proxy Data Err ES]` family. Returns `None`
    /// for ordinary text. The original string is kept verbatim.
    pub fn from_wire(text: &str) -> Option<Self> {
        let captures = sentinel_pattern().captures(text)?;
        let label = captures.name("label").map_or("", |m| m.as_str());
        Some(Self {
            kind: FailureKind::from_label(label)?,
            sentinel: text.to_string(),
        })
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn is_upstream(&self) -> bool {
        self.kind.is_upstream()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sentinel)
    }
}

fn sentinel_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[(?P<label>[^\[\]]*?)\s*\bErr\b[^\[\]]*\]$")
            .expect("sentinel pattern is a valid regex")
    })
}

/// One translated slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatedText {
    Translated(String),
    Failed(Failure),
}

impl TranslatedText {
    /// Decode a plain wire string, turning sentinels back into failures.
    pub fn from_wire(text: impl Into<String>) -> Self {
        let text = text.into();
        match Failure::from_wire(&text) {
            Some(failure) => TranslatedText::Failed(failure),
            None => TranslatedText::Translated(text),
        }
    }

    /// Text written into a document unit or onto the wire.
    pub fn as_text(&self) -> &str {
        match self {
            TranslatedText::Translated(text) => text,
            TranslatedText::Failed(failure) => failure.sentinel(),
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            TranslatedText::Translated(_) => None,
            TranslatedText::Failed(failure) => Some(failure),
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, TranslatedText::Translated(_))
    }

    pub fn is_upstream_failure(&self) -> bool {
        self.failure().is_some_and(Failure::is_upstream)
    }
}

/// Outcome of one per-language provider call.
pub type LanguageOutcome = Result<Vec<TranslatedText>, ProviderError>;

/// Raw gateway output: one outcome per requested language.
#[derive(Debug, Clone, Default)]
pub struct ProviderResult {
    outcomes: BTreeMap<LanguageCode, LanguageOutcome>,
}

impl ProviderResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: LanguageCode, outcome: LanguageOutcome) {
        self.outcomes.insert(language, outcome);
    }

    pub fn get(&self, language: &LanguageCode) -> Option<&LanguageOutcome> {
        self.outcomes.get(language)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.outcomes.keys()
    }

    /// Number of languages whose call failed outright.
    pub fn failed_languages(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_err()).count()
    }
}

/// A reconciled slot joined to the unit it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry {
    pub id: NodeId,
    pub text: TranslatedText,
}

/// Per-language output of the reconciler. Always one entry per unit, in
/// unit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledLanguageResult {
    pub language: LanguageCode,
    pub entries: Vec<ReconciledEntry>,
}

impl ReconciledLanguageResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every entry is an upstream failure (vacuously false when empty).
    pub fn all_upstream_failures(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.text.is_upstream_failure())
    }

    pub fn translated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.text.is_translated()).count()
    }

    /// Wire rendering: one string per unit.
    pub fn to_wire(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.text.as_text().to_string())
            .collect()
    }
}

/// Truncate error detail to at most `max_chars` characters.
pub fn truncate_detail(detail: &str, max_chars: usize) -> String {
    detail.chars().take(max_chars).collect()
}
