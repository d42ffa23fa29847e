use crate::app_dirs::AppDirs;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence for the best words-per-minute ever achieved
pub trait ScoreStore {
    /// Stored best score, or 0 when nothing usable is stored
    fn read_best_score(&self) -> u32;
    fn write_best_score(&self, wpm: u32) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct BestScoreRecord {
    best_wpm: u32,
}

#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::best_score_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for FileScoreStore {
    fn read_best_score(&self) -> u32 {
        let Ok(bytes) = fs::read(&self.path) else {
            return 0;
        };
        match serde_json::from_slice::<BestScoreRecord>(&bytes) {
            Ok(record) => record.best_wpm,
            Err(e) => {
                log::warn!(
                    "ignoring unreadable best score at {}: {e}",
                    self.path.display()
                );
                0
            }
        }
    }

    fn write_best_score(&self, wpm: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&BestScoreRecord { best_wpm: wpm })?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps the best score for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    best: Cell<u32>,
}

impl MemoryScoreStore {
    pub fn new(best: u32) -> Self {
        Self {
            best: Cell::new(best),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn read_best_score(&self) -> u32 {
        self.best.get()
    }

    fn write_best_score(&self, wpm: u32) -> Result<()> {
        self.best.set(wpm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let store = FileScoreStore::with_path(dir.path().join("best.json"));

        assert_eq!(store.read_best_score(), 0);
    }

    #[test]
    fn roundtrip_best_score() {
        let dir = tempdir().unwrap();
        let store = FileScoreStore::with_path(dir.path().join("nested").join("best.json"));

        store.write_best_score(87).unwrap();

        assert_eq!(store.read_best_score(), 87);
    }

    #[test]
    fn corrupt_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs::write(&path, "{\"best_wpm\": \"lots\"").unwrap();

        assert_eq!(FileScoreStore::with_path(&path).read_best_score(), 0);
    }

    #[test]
    fn write_to_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = FileScoreStore::with_path(blocker.join("best.json"));

        assert!(store.write_best_score(10).is_err());
        assert_eq!(store.read_best_score(), 0);
    }

    #[test]
    fn memory_store() {
        let store = MemoryScoreStore::new(12);
        assert_eq!(store.read_best_score(), 12);

        store.write_best_score(40).unwrap();
        assert_eq!(store.read_best_score(), 40);
    }
}
