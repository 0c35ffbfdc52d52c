use crate::config::write_json_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const BEST_SCORE_VERSION: u32 = 1;

/// A single named scalar: the best distance ever reached.
pub(crate) trait ScoreStore {
    /// Missing or unreadable storage reads as 0.
    fn best_score(&self) -> u64;
    fn set_best_score(&mut self, score: u64) -> Result<()>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BestScoreFile {
    version: u32,
    best_score: u64,
}

pub(crate) struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("could not remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl ScoreStore for JsonScoreStore {
    fn best_score(&self) -> u64 {
        if let Ok(s) = fs::read_to_string(&self.path) {
            if let Ok(f) = serde_json::from_str::<BestScoreFile>(&s) {
                return f.best_score;
            }
        }
        0
    }

    fn set_best_score(&mut self, score: u64) -> Result<()> {
        write_json_atomic(
            &self.path,
            &BestScoreFile {
                version: BEST_SCORE_VERSION,
                best_score: score,
            },
        )
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryScoreStore {
    pub(crate) best: u64,
    pub(crate) writes: usize,
    pub(crate) fail_writes: bool,
}

#[cfg(test)]
impl ScoreStore for MemoryScoreStore {
    fn best_score(&self) -> u64 {
        self.best
    }

    fn set_best_score(&mut self, score: u64) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("disk full");
        }
        self.best = score;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scratch_dir;

    #[test]
    fn missing_file_reads_as_zero() {
        let dir = scratch_dir("score-missing");
        let store = JsonScoreStore::new(&dir.join("best_score.json"));
        assert_eq!(store.best_score(), 0);
    }

    #[test]
    fn written_score_survives_a_new_store() {
        let dir = scratch_dir("score-write");
        let path = dir.join("best_score.json");
        let mut store = JsonScoreStore::new(&path);
        store.set_best_score(250).unwrap();
        store.set_best_score(310).unwrap();

        let reopened = JsonScoreStore::new(&path);
        assert_eq!(reopened.best_score(), 310);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn overwrite_replaces_existing_file_and_failed_write_keeps_it() {
        let dir = scratch_dir("score-overwrite");
        let path = dir.join("best_score.json");
        let mut store = JsonScoreStore::new(&path);
        store.set_best_score(250).unwrap();

        // a directory squatting on the staging path makes the write fail
        let tmp = path.with_extension("json.tmp");
        fs::create_dir(&tmp).unwrap();
        assert!(store.set_best_score(900).is_err());
        assert_eq!(store.best_score(), 250);

        fs::remove_dir(&tmp).unwrap();
        store.set_best_score(300).unwrap();
        assert!(!tmp.exists());
        assert_eq!(JsonScoreStore::new(&path).best_score(), 300);
    }

    #[test]
    fn corrupt_file_reads_as_zero_and_clear_removes_it() {
        let dir = scratch_dir("score-corrupt");
        let path = dir.join("best_score.json");
        fs::write(&path, b"[1, 2").unwrap();
        let store = JsonScoreStore::new(&path);
        assert_eq!(store.best_score(), 0);

        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();
    }
}
