//! Error types for the translation pipeline.
//!
//! Only `PreconditionError` ever aborts a run. Every other error is absorbed
//! into a per-language or per-unit failure value (see `model::Failure`).

use crate::document::{FontDescriptor, NodeId};
use thiserror::Error;

/// Failure of a single per-language provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached.
    #[error("network error: {0}")]
    Transport(String),

    /// The provider answered, but not in the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider answered without an entry for the language.
    #[error("language missing from provider response")]
    Missing,
}

impl ProviderError {
    /// HTTP status of a rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Violations detected before any translation attempt. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("nothing is selected; select one frame")]
    NoSelection,

    #[error("select exactly one frame: {0}")]
    InvalidSelection(String),

    #[error("no text found in the selected frame")]
    EmptySelection,

    #[error("translation endpoint is not configured: {0}")]
    EndpointNotConfigured(String),

    #[error("no target languages configured")]
    NoTargetLanguages,

    #[error("translation API key is missing")]
    MissingApiKey,
}

/// Errors reported by the content extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("nothing is selected")]
    NoSelection,

    #[error("{0}")]
    InvalidSelection(String),

    #[error("selection contains no text")]
    EmptySelection,
}

impl From<ExtractError> for PreconditionError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::NoSelection => PreconditionError::NoSelection,
            ExtractError::InvalidSelection(detail) => PreconditionError::InvalidSelection(detail),
            ExtractError::EmptySelection => PreconditionError::EmptySelection,
        }
    }
}

/// Errors raised by a host document when a node operation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not a frame")]
    NotAFrame(NodeId),

    #[error("node {0} is not a text node")]
    NotAText(NodeId),
}

/// A font resource could not be made available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontLoadError {
    #[error("font not available: {0}")]
    Unavailable(FontDescriptor),
}

/// Invalid language code input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("language code is empty")]
    Empty,

    #[error("invalid language code: '{0}'")]
    Invalid(String),

    #[error("no target languages given")]
    NoLanguages,
}
