//! File-backed vector index with exhaustive cosine search.

use crate::store::{
    payload::{current_timestamp_rfc3339, settings_fingerprint},
    types::{
        FORMAT_VERSION, IndexManifest, IndexSettings, ScoredChunk, StoreError, StoredChunk,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";

/// Persisted chunk vectors loaded into memory.
///
/// The directory holds `chunks.json` and `manifest.json`. The manifest is written last, so a
/// directory without one was never completely built.
#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    manifest: IndexManifest,
    chunks: Vec<StoredChunk>,
}

impl VectorIndex {
    /// Whether `dir` exists and contains at least one entry.
    pub fn is_populated(dir: &Path) -> bool {
        fs::read_dir(dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Persist `chunks` under `dir` and return the in-memory index.
    pub fn create(
        dir: &Path,
        settings: &IndexSettings,
        source: &str,
        chunks: Vec<StoredChunk>,
    ) -> Result<Self, StoreError> {
        let dimension = chunks.first().map(|chunk| chunk.vector.len()).unwrap_or(0);
        if let Some(chunk) = chunks.iter().find(|chunk| chunk.vector.len() != dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: chunk.vector.len(),
            });
        }

        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedding_model: settings.embedding_model.clone(),
            dimension,
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
            chunk_count: chunks.len(),
            source: source.to_string(),
            fingerprint: settings_fingerprint(settings),
            created_at: current_timestamp_rfc3339(),
        };

        write_json(&dir.join(CHUNKS_FILE), &chunks)?;
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;

        tracing::debug!(
            dir = %dir.display(),
            chunks = manifest.chunk_count,
            dimension,
            "Index persisted"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            chunks,
        })
    }

    /// Open an index previously written by [`VectorIndex::create`].
    ///
    /// Fails with [`StoreError::ConfigMismatch`] when the index was built with other settings.
    pub fn open(dir: &Path, settings: &IndexSettings) -> Result<Self, StoreError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(StoreError::Corrupt {
                path: dir.to_path_buf(),
                reason: format!("{MANIFEST_FILE} is missing"),
            });
        }
        let manifest: IndexManifest = read_json(&manifest_path)?;
        validate_manifest(dir, &manifest, settings)?;

        let chunks: Vec<StoredChunk> = read_json(&dir.join(CHUNKS_FILE))?;
        if chunks.len() != manifest.chunk_count {
            return Err(StoreError::Corrupt {
                path: dir.to_path_buf(),
                reason: format!(
                    "manifest lists {} chunks but {} were found",
                    manifest.chunk_count,
                    chunks.len()
                ),
            });
        }
        if let Some(chunk) = chunks
            .iter()
            .find(|chunk| chunk.vector.len() != manifest.dimension)
        {
            return Err(StoreError::DimensionMismatch {
                expected: manifest.dimension,
                actual: chunk.vector.len(),
            });
        }

        tracing::debug!(
            dir = %dir.display(),
            chunks = chunks.len(),
            created_at = %manifest.created_at,
            "Index opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            chunks,
        })
    }

    /// Return the `k` chunks most similar to `query`, nearest first.
    ///
    /// Equal scores keep the order in which chunks were stored.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        if !self.chunks.is_empty() && query.len() != self.manifest.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| (position, cosine_similarity(query, &chunk.vector)))
            .collect();
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| {
                let chunk = &self.chunks[position];
                ScoredChunk {
                    text: chunk.text.clone(),
                    page: chunk.page,
                    score,
                }
            })
            .collect())
    }

    /// Manifest describing the index.
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Directory the index lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn validate_manifest(
    dir: &Path,
    manifest: &IndexManifest,
    settings: &IndexSettings,
) -> Result<(), StoreError> {
    let mismatch = |field: &'static str, expected: String, found: String| {
        Err(StoreError::ConfigMismatch {
            path: dir.to_path_buf(),
            field,
            expected,
            found,
        })
    };

    if manifest.format_version != FORMAT_VERSION {
        return mismatch(
            "format_version",
            FORMAT_VERSION.to_string(),
            manifest.format_version.to_string(),
        );
    }
    if manifest.embedding_model != settings.embedding_model {
        return mismatch(
            "embedding_model",
            settings.embedding_model.clone(),
            manifest.embedding_model.clone(),
        );
    }
    if manifest.chunk_size != settings.chunk_size {
        return mismatch(
            "chunk_size",
            settings.chunk_size.to_string(),
            manifest.chunk_size.to_string(),
        );
    }
    if manifest.chunk_overlap != settings.chunk_overlap {
        return mismatch(
            "chunk_overlap",
            settings.chunk_overlap.to_string(),
            manifest.chunk_overlap.to_string(),
        );
    }
    let expected = settings_fingerprint(settings);
    if manifest.fingerprint != expected {
        return mismatch("fingerprint", expected, manifest.fingerprint.clone());
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let encoded = serde_json::to_vec(value).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, encoded).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
