//! Validated language codes.
//!
//! A `LanguageCode` is the key for every per-language value in the pipeline
//! (provider outcomes, reconciled results, frame names). Codes are accepted
//! case-insensitively and stored upper-case, matching the provider's wire
//! format. Codes outside the registry are allowed so the proxy can pass new
//! provider languages through unchanged.

use crate::error::LanguageError;
use crate::i18n::LanguageRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest code accepted (e.g. "PT-BR", "ZH-HANS" fit comfortably).
const MAX_CODE_LEN: usize = 16;

/// A validated, upper-case language code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalise a language code.
    ///
    /// # Returns
    /// * `Ok(LanguageCode)` for non-empty codes made of ASCII letters, digits,
    ///   `-` or `_`
    /// * `Err(LanguageError)` otherwise
    ///
    /// # Example
    /// ```ignore
    /// let spanish = LanguageCode::parse(" es ")?;
    /// assert_eq!(spanish.as_str(), "ES");
    /// ```
    pub fn parse(code: &str) -> Result<Self, LanguageError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(LanguageError::Empty);
        }

        if trimmed.len() > MAX_CODE_LEN
            || !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LanguageError::Invalid(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The upper-case code as sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English display name from the registry, or the code itself when the
    /// registry does not know the language.
    pub fn name(&self) -> &str {
        LanguageRegistry::get()
            .get_by_code(&self.0)
            .map(|config| config.name)
            .unwrap_or(&self.0)
    }

    /// The registry's default target languages, in layout order.
    pub fn defaults() -> Vec<LanguageCode> {
        LanguageRegistry::get()
            .default_targets()
            .into_iter()
            .map(|config| LanguageCode(config.code.to_string()))
            .collect()
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// Parse a comma-separated list such as `"AR, es,NL"`.
///
/// Duplicates are dropped (first occurrence wins) and order is preserved,
/// since it decides where each translated frame is placed.
pub fn parse_language_list(list: &str) -> Result<Vec<LanguageCode>, LanguageError> {
    let mut codes: Vec<LanguageCode> = Vec::new();

    for part in list.split(',').filter(|part| !part.trim().is_empty()) {
        let code = LanguageCode::parse(part)?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    if codes.is_empty() {
        return Err(LanguageError::NoLanguages);
    }

    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse Tests ====================

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let code = LanguageCode::parse(" es ").expect("Should parse");
        assert_eq!(code.as_str(), "ES");
    }

    #[test]
    fn test_parse_accepts_regional_variants() {
        assert_eq!(LanguageCode::parse("pt-br").unwrap().as_str(), "PT-BR");
        assert_eq!(LanguageCode::parse("zh_hans").unwrap().as_str(), "ZH_HANS");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(LanguageCode::parse(""), Err(LanguageError::Empty));
        assert_eq!(LanguageCode::parse("   "), Err(LanguageError::Empty));
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        assert!(matches!(
            LanguageCode::parse("es;drop"),
            Err(LanguageError::Invalid(_))
        ));
        assert!(LanguageCode::parse("fr#").is_err());
        assert!(LanguageCode::parse("a-very-long-language-code").is_err());
    }

    // ==================== Registry Lookup Tests ====================

    #[test]
    fn test_name_from_registry() {
        assert_eq!(LanguageCode::parse("fr").unwrap().name(), "French");
        assert_eq!(LanguageCode::parse("AR").unwrap().name(), "Arabic");
    }

    #[test]
    fn test_name_falls_back_to_code() {
        let code = LanguageCode::parse("xx").unwrap();
        assert_eq!(code.name(), "XX");
    }

    #[test]
    fn test_defaults_match_registry() {
        let defaults: Vec<String> = LanguageCode::defaults()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(defaults, vec!["AR", "ES", "NL", "PT", "FR"]);
    }

    // ==================== List Parsing Tests ====================

    #[test]
    fn test_parse_language_list_preserves_order() {
        let codes = parse_language_list("fr, es,NL").expect("Should parse");
        let codes: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["FR", "ES", "NL"]);
    }

    #[test]
    fn test_parse_language_list_drops_duplicates() {
        let codes = parse_language_list("ES,es,FR,Es").expect("Should parse");
        assert_eq!(codes.len(), 2);
    }

    #[test]
    fn test_parse_language_list_skips_blank_entries() {
        let codes = parse_language_list("ES,,FR,").expect("Should parse");
        assert_eq!(codes.len(), 2);
    }

    #[test]
    fn test_parse_language_list_empty() {
        assert_eq!(parse_language_list(""), Err(LanguageError::NoLanguages));
        assert_eq!(parse_language_list(" , "), Err(LanguageError::NoLanguages));
    }

    #[test]
    fn test_parse_language_list_invalid_entry() {
        assert!(parse_language_list("ES,f@r").is_err());
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_serde_roundtrip_normalises() {
        let code: LanguageCode = serde_json::from_str("\"nl\"").expect("deserialize");
        assert_eq!(code.as_str(), "NL");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"NL\"");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<LanguageCode>("\"\"").is_err());
    }

    #[test]
    fn test_display_and_from_str() {
        let code: LanguageCode = "pt".parse().expect("Should parse");
        assert_eq!(code.to_string(), "PT");
    }
}
