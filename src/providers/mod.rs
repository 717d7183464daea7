//! Translation providers.
//!
//! `DeepLProvider` talks to DeepL directly and backs the proxy server.
//! `ProxyProvider` talks to that proxy and backs the `translate-frame` CLI.

mod deepl;
mod proxy;

pub use deepl::{default_base_url, DeepLProvider};
pub use proxy::{validate_endpoint, ProxyProvider, PLACEHOLDER_ENDPOINT};

use crate::error::ProviderError;

/// Whether a provider error is worth another attempt.
///
/// Rate limits, 5xx responses and network failures are transient. Other
/// rejections (bad key, quota) and malformed bodies are not.
pub(crate) fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::Rejected { status, .. } => *status == 429 || *status >= 500,
        ProviderError::Transport(_) => true,
        ProviderError::Malformed(_) | ProviderError::Missing => false,
    }
}
