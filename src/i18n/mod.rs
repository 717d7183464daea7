//! Target-language handling.
//!
//! - `registry`: the default target set with display names
//! - `language`: the validated `LanguageCode` type used as the key for every
//!   per-language result in the pipeline
//! - `metrics`: process-wide counters for provider calls and per-language
//!   outcomes
//!
//! # Example
//!
//! ```rust,ignore
//! use frame_translator::i18n::{LanguageCode, LanguageRegistry};
//!
//! let spanish = LanguageCode::parse("es")?;
//! assert_eq!(spanish.as_str(), "ES");
//!
//! let defaults = LanguageRegistry::get().default_targets();
//! ```

mod language;
mod metrics;
mod registry;

pub use language::{parse_language_list, LanguageCode};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
