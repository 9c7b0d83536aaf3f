use crate::config::atomic_rename;
use crate::migrate;
use crate::model::ProgressState;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where the single serialized progress record lives.
pub(crate) trait Store {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&self, data: &str) -> Result<(), StoreError>;
    /// Keeps an unreadable record somewhere it will not be overwritten.
    fn quarantine(&self, data: &str) -> Result<(), StoreError>;
}

pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Store for JsonFileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn write(&self, data: &str) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|e| StoreError::io(&tmp, e))?;
        atomic_rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn quarantine(&self, data: &str) -> Result<(), StoreError> {
        let aside = self.path.with_extension("json.corrupt");
        fs::write(&aside, data).map_err(|e| StoreError::io(&aside, e))?;
        warn!(path = %aside.display(), "unreadable save moved aside");
        Ok(())
    }
}

pub(crate) fn load_state(store: &dyn Store) -> Result<ProgressState, StoreError> {
    let Some(raw) = store.read()? else {
        info!("no saved progress, starting a new journey");
        return Ok(ProgressState::default());
    };
    match migrate::decode(&raw) {
        Some(state) => Ok(state),
        None => {
            store.quarantine(&raw)?;
            Ok(ProgressState::default())
        }
    }
}

pub(crate) fn save_state(store: &dyn Store, state: &ProgressState) -> Result<(), StoreError> {
    let data = serde_json::to_string_pretty(state)?;
    store.write(&data)?;
    debug!(total_xp = state.total_xp, "progress saved");
    Ok(())
}

/// Exclusive hold on the save for one read-modify-write cycle. Released on
/// drop.
pub(crate) struct SaveLock {
    _file: File,
}

impl SaveLock {
    pub(crate) fn acquire(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;
        file.lock_exclusive().map_err(|e| StoreError::io(path, e))?;
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
pub(crate) struct MemoryStore {
    data: std::cell::RefCell<Option<String>>,
    quarantined: std::cell::RefCell<Option<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn new(initial: Option<&str>) -> Self {
        Self {
            data: std::cell::RefCell::new(initial.map(str::to_string)),
            quarantined: std::cell::RefCell::new(None),
        }
    }

    pub(crate) fn contents(&self) -> Option<String> {
        self.data.borrow().clone()
    }

    pub(crate) fn quarantined(&self) -> Option<String> {
        self.quarantined.borrow().clone()
    }
}

#[cfg(test)]
impl Store for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.data.borrow().clone())
    }

    fn write(&self, data: &str) -> Result<(), StoreError> {
        *self.data.borrow_mut() = Some(data.to_string());
        Ok(())
    }

    fn quarantine(&self, data: &str) -> Result<(), StoreError> {
        *self.quarantined.borrow_mut() = Some(data.to_string());
        Ok(())
    }
}
