//! Helpers for hashing and stamping persisted records.

use crate::store::types::{FORMAT_VERSION, IndexSettings};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest over everything that makes two indexes interchangeable.
pub(crate) fn settings_fingerprint(settings: &IndexSettings) -> String {
    let mut hasher = Sha256::new();
    hasher.update(FORMAT_VERSION.to_le_bytes());
    hasher.update(settings.embedding_model.as_bytes());
    hasher.update([0]);
    hasher.update((settings.chunk_size as u64).to_le_bytes());
    hasher.update((settings.chunk_overlap as u64).to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Current timestamp formatted for the manifest.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier for a chunk record.
pub(crate) fn generate_chunk_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(chunk_size: usize) -> IndexSettings {
        IndexSettings {
            embedding_model: "text-embedding-ada-002".into(),
            chunk_size,
            chunk_overlap: 200,
        }
    }

    #[test]
    fn chunk_hash_is_stable() {
        let h1 = compute_chunk_hash("Hello world");
        let h2 = compute_chunk_hash("Hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn fingerprint_tracks_chunking_settings() {
        assert_eq!(
            settings_fingerprint(&settings(1000)),
            settings_fingerprint(&settings(1000))
        );
        assert_ne!(
            settings_fingerprint(&settings(1000)),
            settings_fingerprint(&settings(500))
        );
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn chunk_ids_are_unique() {
        assert_ne!(generate_chunk_id(), generate_chunk_id());
    }
}
