//! Pluggable image verification.
//!
//! The engine never performs cryptographic checks itself. Callers inject an
//! [`ImageVerifier`]; [`TrustStore`] is the built-in one backed by a list of
//! trusted references per key.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

pub trait ImageVerifier: Send + Sync {
    /// Whether `image_ref` carries a valid signature or digest for `key`.
    fn verify(&self, image_ref: &str, key: &str) -> bool;
}

impl<F> ImageVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, image_ref: &str, key: &str) -> bool {
        self(image_ref, key)
    }
}

/// Serialized trust store:
///
/// ```yaml
/// keys:
///   - key: cosign.pub
///     images:
///       - ghcr.io/org/app:1.0
///       - sha256:4c5d...
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrustStoreFile {
    #[serde(default)]
    pub keys: Vec<TrustedKey>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrustedKey {
    pub key: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Key -> trusted image references or `sha256:` digests. Empty verifies nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustStore {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trust(&mut self, key: &str, image: &str) {
        self.entries
            .entry(key.trim().to_string())
            .or_default()
            .insert(image.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<TrustStoreFile> for TrustStore {
    fn from(file: TrustStoreFile) -> Self {
        let mut store = TrustStore::new();
        for entry in file.keys {
            for image in &entry.images {
                store.trust(&entry.key, image);
            }
        }
        store
    }
}

impl ImageVerifier for TrustStore {
    fn verify(&self, image_ref: &str, key: &str) -> bool {
        let Some(trusted) = self.entries.get(key.trim()) else {
            return false;
        };
        if trusted.contains(image_ref) {
            return true;
        }
        // `repo@sha256:abc` is trusted when its digest is listed on its own.
        image_ref
            .split_once('@')
            .is_some_and(|(_, digest)| digest.starts_with("sha256:") && trusted.contains(digest))
    }
}
