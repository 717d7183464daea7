//! Translate a selected design frame into one cloned frame per language.
//!
//! The pipeline runs in four stages, each in its own module:
//!
//! - `document::DesignDocument::extract` collects the frame's text units
//! - `gateway` asks a `TranslationProvider` for every language, one call each
//! - `reconcile` validates the answers against the batch, slot by slot
//! - `materialize` clones the frame per usable language and writes the text
//!
//! `orchestrator` sequences them; `server` is the proxy that holds the DeepL
//! key and speaks the same positional wire format.

pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod materialize;
pub mod model;
pub mod orchestrator;
pub mod providers;
pub mod reconcile;
pub mod retry;
pub mod server;
pub mod status;
