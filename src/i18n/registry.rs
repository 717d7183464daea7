//! Language registry: the default target languages and their display names.
//!
//! Codes follow the provider's convention (upper-case, e.g. "ES", "PT").
//! The registry is a lazily initialised singleton behind `OnceLock`.

use std::sync::OnceLock;

/// Metadata for a target language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Provider language code (e.g., "ES", "FR")
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish")
    pub name: &'static str,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code (case-insensitive).
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the language exists
    /// * `None` if the language is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Get the default target languages, in the order frames are laid out.
    pub fn default_targets(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "AR",
            name: "Arabic",
        },
        LanguageConfig {
            code: "ES",
            name: "Spanish",
        },
        LanguageConfig {
            code: "NL",
            name: "Dutch",
        },
        LanguageConfig {
            code: "PT",
            name: "Portuguese",
        },
        LanguageConfig {
            code: "FR",
            name: "French",
        },
    ]
}
