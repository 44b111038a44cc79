//! File-backed JSON documents.
//!
//! Each document is a single JSON object rewritten in full on every save.
//! Writes go to a sibling temporary file first and are renamed over the
//! target, so readers never observe a half-written document.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{document} at {path} is corrupt: {source}")]
    Corrupt {
        document: Document,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {document}: {source}")]
    Encode {
        document: Document,
        #[source]
        source: serde_json::Error,
    },
}

/// The three independently persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    DailyMarkers,
    Rosters,
    Tallies,
}

impl Document {
    pub fn file_name(self) -> &'static str {
        match self {
            Document::DailyMarkers => "last_used.json",
            Document::Rosters => "members.json",
            Document::Tallies => "clown_stats.json",
        }
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Document::DailyMarkers => "daily markers",
            Document::Rosters => "rosters",
            Document::Tallies => "tallies",
        };
        f.write_str(name)
    }
}

/// Loads and saves documents under one data directory
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_of(&self, document: Document) -> PathBuf {
        self.data_dir.join(document.file_name())
    }

    /// Load a document. A missing file yields the empty (default) value.
    pub async fn load<T>(&self, document: Document) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_of(document);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(%document, path = %path.display(), "No document on disk, starting empty");
                return Ok(T::default());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            document,
            path,
            source,
        })
    }

    /// Replace a document's full contents
    pub async fn save<T>(&self, document: Document, value: &T) -> StoreResult<()>
    where
        T: Serialize,
    {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Encode { document, source })?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.data_dir.clone(),
                source,
            })?;

        let path = self.path_of(document);
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io { path, source });
        }

        tracing::debug!(%document, path = %path.display(), "Document saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_missing_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let markers: DailyMarkers = store.load(Document::DailyMarkers).await.unwrap();
        assert!(markers.is_empty());
    }

    #[tokio::test]
    async fn test_empty_document_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        store.save(Document::Tallies, &Tallies::new()).await.unwrap();
        let loaded: Tallies = store.load(Document::Tallies).await.unwrap();
        assert!(loaded.is_empty());
        assert!(store.path_of(Document::Tallies).exists());
    }

    #[tokio::test]
    async fn test_rosters_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut rosters = Rosters::new();
        rosters.insert(
            "-100123".to_string(),
            vec![Member {
                id: Some(7),
                handle: Some("masha".to_string()),
                display_name: "Маша".to_string(),
                active: true,
                added_by: SYSTEM_ADDED_BY.to_string(),
                added_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            }],
        );

        store.save(Document::Rosters, &rosters).await.unwrap();
        let loaded: Rosters = store.load(Document::Rosters).await.unwrap();
        assert_eq!(loaded, rosters);
    }

    #[tokio::test]
    async fn test_tally_order_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut table = TallyTable::new();
        for (key, name) in [("9", "Зоя"), ("1", "Аня"), ("username:kolya", "Коля")] {
            table.insert(
                key.to_string(),
                TallyEntry {
                    name: name.to_string(),
                    handle: String::new(),
                    count: 1,
                },
            );
        }
        let mut tallies = Tallies::new();
        tallies.insert("1".to_string(), table);

        store.save(Document::Tallies, &tallies).await.unwrap();
        let loaded: Tallies = store.load(Document::Tallies).await.unwrap();

        let keys: Vec<_> = loaded["1"].keys().cloned().collect();
        assert_eq!(keys, vec!["9", "1", "username:kolya"]);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::fs::write(store.path_of(Document::DailyMarkers), "{not json").unwrap();

        let result: StoreResult<DailyMarkers> = store.load(Document::DailyMarkers).await;
        assert!(matches!(
            result,
            Err(StoreError::Corrupt {
                document: Document::DailyMarkers,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_save_creates_data_dir_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested").join("data"));

        let mut markers = DailyMarkers::new();
        markers.insert("5".to_string(), "2024-06-01".to_string());
        store.save(Document::DailyMarkers, &markers).await.unwrap();

        let path = store.path_of(Document::DailyMarkers);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_keeps_non_ascii_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut tallies = Tallies::new();
        let mut table = TallyTable::new();
        table.insert(
            "3".to_string(),
            TallyEntry {
                name: "Петя".to_string(),
                handle: "petya".to_string(),
                count: 2,
            },
        );
        tallies.insert("1".to_string(), table);
        store.save(Document::Tallies, &tallies).await.unwrap();

        let raw = std::fs::read_to_string(store.path_of(Document::Tallies)).unwrap();
        assert!(raw.contains("Петя"));
    }
}
