// src/identity.rs

//! Record identities.
//!
//! - Primary ID: `base64(HMAC-SHA256(secret, "{location}-{date}-{state}"))`,
//!   the store's upsert key. Re-ingesting the same location, date and state
//!   overwrites instead of duplicating.
//! - Secondary ID: `"{date}-{slug(location)}"`, the query lookup key. It has
//!   no state component, so the same town in two states collides on purpose.

use std::fmt;
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;

use crate::error::{AppError, Result};
use crate::models::DATE_FORMAT;

type HmacSha256 = Hmac<Sha256>;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("slug pattern is valid"));

/// Keyed hasher for primary IDs.
#[derive(Clone)]
pub struct IdentityKey {
    mac: HmacSha256,
}

impl IdentityKey {
    /// Build a key from the configured secret.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::config("identity secret is empty"));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::config(format!("invalid identity secret: {e}")))?;
        Ok(Self { mac })
    }

    /// Compute the primary ID for a location, date and state.
    pub fn primary_id(&self, location: &str, date: NaiveDate, state: &str) -> String {
        let message = format!("{}-{}-{}", location, date.format(DATE_FORMAT), state);
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityKey(<redacted>)")
    }
}

/// Lowercase `text` and collapse every run of non-alphanumerics into one hyphen.
///
/// Punctuation at either end still becomes a hyphen; stored keys depend on it.
pub fn slug(text: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

/// Compute the secondary ID for a location and date.
pub fn secondary_id(location: &str, date: NaiveDate) -> String {
    format!("{}-{}", date.format(DATE_FORMAT), slug(location))
}
