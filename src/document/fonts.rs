//! Font resource loading.

use super::FontDescriptor;
use crate::error::FontLoadError;
use async_trait::async_trait;
use std::collections::HashSet;

/// Makes a font face usable before text that depends on it is written.
#[async_trait]
pub trait FontLoader: Send + Sync {
    async fn ensure_loaded(&self, font: &FontDescriptor) -> Result<(), FontLoadError>;
}

/// A fixed set of available fonts.
///
/// `permissive()` accepts any face, which is what the CLI uses when the
/// document carries no font information worth checking.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    available: Option<HashSet<FontDescriptor>>,
}

impl FontCatalog {
    pub fn new(fonts: impl IntoIterator<Item = FontDescriptor>) -> Self {
        Self {
            available: Some(fonts.into_iter().collect()),
        }
    }

    pub fn permissive() -> Self {
        Self { available: None }
    }

    pub fn contains(&self, font: &FontDescriptor) -> bool {
        self.available
            .as_ref()
            .map_or(true, |fonts| fonts.contains(font))
    }
}

#[async_trait]
impl FontLoader for FontCatalog {
    async fn ensure_loaded(&self, font: &FontDescriptor) -> Result<(), FontLoadError> {
        if self.contains(font) {
            Ok(())
        } else {
            tracing::debug!("Font unavailable: {}", font);
            Err(FontLoadError::Unavailable(font.clone()))
        }
    }
}
