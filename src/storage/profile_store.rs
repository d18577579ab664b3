use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::application::models::profile::Profile;
use crate::error::AppError;

/// In-memory profile collection keyed by profile id, shared between the
/// scraper and anything reading alongside it. Persistence is a single
/// JSON document; `load` of a `persist`ed store reproduces it exactly.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: RwLock<BTreeMap<String, Profile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BTreeMap<String, Profile>> {
        self.profiles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Profile>> {
        self.profiles.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn has(&self, profile_id: &str) -> bool {
        self.read_guard().contains_key(profile_id)
    }

    /// Inserts a profile, or folds new images into the stored copy when
    /// the id is already known. Returns whether the profile was new.
    pub fn upsert(&self, profile: Profile) -> bool {
        let mut guard = self.write_guard();
        match guard.get_mut(&profile.profile_id) {
            Some(existing) => {
                existing.augment_images(&profile.images);
                false
            }
            None => {
                guard.insert(profile.profile_id.clone(), profile);
                true
            }
        }
    }

    pub fn all(&self) -> Vec<Profile> {
        self.read_guard().values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.read_guard().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Writes the whole store as pretty-printed JSON, through a temp file
    /// so a crash mid-write cannot truncate the previous snapshot.
    pub fn persist(&self, path: &Path) -> Result<usize, AppError> {
        let snapshot = self.read_guard().clone();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;

        debug!("Persisted {} profiles to {}", snapshot.len(), path.display());
        Ok(snapshot.len())
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        let profiles: BTreeMap<String, Profile> = serde_json::from_str(&json)?;
        info!("Loaded {} profiles from {}", profiles.len(), path.display());
        Ok(Self {
            profiles: RwLock::new(profiles),
        })
    }

    /// Loads a previous snapshot, or starts empty when none exists yet.
    /// Anything other than a missing file still surfaces as an error.
    pub fn load_or_default(path: &Path) -> Result<Self, AppError> {
        match Self::load(path) {
            Ok(store) => Ok(store),
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }
}
