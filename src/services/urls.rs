//! URL Freshness Policy
//!
//! Rewrites stored-asset URLs with cache-defeating query parameters.
//!
//! Uploads overwrite objects in place, so browsers and CDNs can hold stale
//! copies of a replaced asset. Every URL handed to a consumer goes through
//! [`with_freshness_token`]: any existing query string is stripped, then the
//! freshness parameters are appended. The persisted reference keeps the bare
//! URL; tokens are a read-time and write-time presentation concern only.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Freshness parameters appended to a display URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessOptions {
    /// Append a random numeric suffix in addition to the timestamp.
    pub random_suffix: bool,
    /// On-the-fly transcoding format hint, e.g. `webp`.
    pub format: Option<String>,
    /// Transcoding quality hint (1-100).
    pub quality: Option<u8>,
}

impl FreshnessOptions {
    /// Timestamp-only token.
    pub fn timestamp_only() -> Self {
        Self {
            random_suffix: false,
            format: None,
            quality: None,
        }
    }

    /// Timestamp, random suffix, and a WebP transcoding hint.
    pub fn webp(quality: u8) -> Self {
        Self {
            random_suffix: true,
            format: Some("webp".to_string()),
            quality: Some(quality.clamp(1, 100)),
        }
    }
}

impl Default for FreshnessOptions {
    fn default() -> Self {
        Self {
            random_suffix: true,
            format: None,
            quality: None,
        }
    }
}

/// Rewrite a URL with a fresh cache-busting token.
///
/// Strip-then-append: pre-existing query parameters never survive, so
/// repeated rewrites cannot accumulate tokens.
pub fn with_freshness_token(url: &str, options: &FreshnessOptions) -> String {
    let timestamp = Utc::now().timestamp_millis();

    let mut params = vec![("t".to_string(), timestamp.to_string())];
    if options.random_suffix {
        params.push(("r".to_string(), random_nonce().to_string()));
    }
    if let Some(format) = &options.format {
        params.push(("format".to_string(), format.clone()));
    }
    if let Some(quality) = options.quality {
        params.push(("quality".to_string(), quality.to_string()));
    }

    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.set_query(None);
            {
                let mut pairs = parsed.query_pairs_mut();
                for (key, value) in &params {
                    pairs.append_pair(key, value);
                }
            }
            parsed.to_string()
        }
        // Relative or protocol-relative URLs fall back to string handling.
        Err(_) => {
            let bare = url.split(['?', '#']).next().unwrap_or(url);
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", bare, query)
        }
    }
}

fn random_nonce() -> u32 {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as u32
}
