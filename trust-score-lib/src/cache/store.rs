//! Where ratings are kept between runs.

use super::LOG_TARGET;
use super::store_lock::{lock_exclusive, lock_shared};
use crate::Result;
use crate::pipeline::Rating;
use chrono::{DateTime, Utc};
use core::fmt;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage for the latest rating of each artifact, keyed by artifact id.
///
/// Stores only persist and retrieve; freshness is judged by the caller.
pub trait RatingStore: Send + Sync + fmt::Debug {
    /// The stored rating for `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Rating>>;

    /// Store `rating` under its id, replacing any previous one.
    fn save(&self, rating: &Rating) -> Result<()>;
}

/// A process-local store.
#[derive(Debug, Default)]
pub struct MemoryRatingStore {
    ratings: Mutex<HashMap<String, Rating>>,
}

impl MemoryRatingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for MemoryRatingStore {
    fn load(&self, key: &str) -> Result<Option<Rating>> {
        let ratings = self.ratings.lock().map_err(|_| app_err!("rating store lock poisoned"))?;
        Ok(ratings.get(key).cloned())
    }

    fn save(&self, rating: &Rating) -> Result<()> {
        let mut ratings = self.ratings.lock().map_err(|_| app_err!("rating store lock poisoned"))?;
        let _ = ratings.insert(rating.id().to_string(), rating.clone());
        Ok(())
    }
}

/// On-disk representation of a stored rating.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct Envelope<T> {
    timestamp: DateTime<Utc>,
    payload: T,
}

/// Replace characters that are unsafe in a file name.
///
/// Artifact ids contain `/` (`owner/model`) and may be whole URLs.
#[must_use]
pub fn sanitize_path_component(s: &str) -> String {
    let s = s.replace("..", "__");
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

/// One JSON file per artifact under a directory.
///
/// Readers and writers in different processes coordinate through an advisory lock on the
/// directory, and each file is replaced by an atomic rename.
#[derive(Debug, Clone)]
pub struct FileRatingStore {
    dir: PathBuf,
}

impl FileRatingStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform's cache directory for this tool.
    pub fn default_dir() -> Result<PathBuf> {
        Ok(directories::BaseDirs::new()
            .into_app_err("could not determine cache directory")?
            .cache_dir()
            .join("trust-score")
            .join("ratings"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_path_component(key)))
    }
}

impl RatingStore for FileRatingStore {
    fn load(&self, key: &str) -> Result<Option<Rating>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }

        let path = self.path_for(key);
        let _lock = lock_shared(&self.dir)?;

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).into_app_err_with(|| format!("opening stored rating '{}'", path.display())),
        };

        match serde_json::from_reader::<_, Envelope<Rating>>(BufReader::new(file)) {
            Ok(envelope) if envelope.payload.id() == key => Ok(Some(envelope.payload)),
            Ok(envelope) => {
                log::debug!(
                    target: LOG_TARGET,
                    "Ignoring stored rating '{}': it belongs to '{}', not '{key}'",
                    path.display(),
                    envelope.payload.id()
                );
                Ok(None)
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring unreadable stored rating '{}': {e:#}", path.display());
                Ok(None)
            }
        }
    }

    fn save(&self, rating: &Rating) -> Result<()> {
        fs::create_dir_all(&self.dir).into_app_err_with(|| format!("creating directory '{}'", self.dir.display()))?;

        let path = self.path_for(rating.id());
        let envelope = Envelope {
            timestamp: Utc::now(),
            payload: rating,
        };

        let _lock = lock_exclusive(&self.dir)?;

        let mut temp = NamedTempFile::new_in(&self.dir)
            .into_app_err_with(|| format!("creating temporary rating file in '{}'", self.dir.display()))?;
        let mut writer = BufWriter::new(temp.as_file_mut());

        #[cfg(debug_assertions)]
        let result = serde_json::to_writer_pretty(&mut writer, &envelope);
        #[cfg(not(debug_assertions))]
        let result = serde_json::to_writer(&mut writer, &envelope);

        result.into_app_err_with(|| format!("writing rating file '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing rating file '{}'", path.display()))?;
        drop(writer);

        let _ = temp
            .persist(&path)
            .map_err(|e| e.error)
            .into_app_err_with(|| format!("replacing rating file '{}'", path.display()))?;

        log::debug!(target: LOG_TARGET, "Stored rating for '{}' in '{}'", rating.id(), path.display());
        Ok(())
    }
}
