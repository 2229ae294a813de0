//! Subscriber document persistence.
//!
//! The JSON file is the source of truth: every operation reloads it, so
//! edits made to the file while the bot runs are picked up. An async mutex
//! serialises the reload-mutate-save sequences of concurrent tasks so one
//! task's write cannot clobber another's.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::record::{Subscriber, SubscriberDocument, Subscribers, UserId};

/// Errors that can occur while reading or writing the subscriber document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed subscriber document: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to serialize subscriber document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Load/save access to the subscriber document.
#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    default_list: String,
    lock: Mutex<()>,
}

impl SubscriberStore {
    /// Creates a store for the document at `path`.
    ///
    /// `default_list` is given to records that come back from disk
    /// without any lists.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, default_list: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_list: default_list.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn default_list(&self) -> &str {
        &self.default_list
    }

    /// Reads the document.
    ///
    /// A missing document is created empty. A malformed one is logged and
    /// read as empty; it is overwritten by the next successful save. A
    /// document that cannot be read is an error, so nothing built from it
    /// gets saved over the real contents.
    pub fn load(&self) -> Result<Subscribers, StoreError> {
        match self.try_load() {
            Ok(Some(subscribers)) => Ok(subscribers),
            Ok(None) => {
                debug!("No subscriber document at {}, creating one", self.path.display());
                let empty = Subscribers::new();
                if let Err(e) = self.save(&empty) {
                    warn!("Failed to create subscriber document: {}", e);
                }
                Ok(empty)
            }
            Err(e @ StoreError::Parse(_)) => {
                warn!("Treating subscriber document as empty: {}", e);
                Ok(Subscribers::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Reads the document, returning `Ok(None)` if it does not exist.
    pub fn try_load(&self) -> Result<Option<Subscribers>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let doc: SubscriberDocument = serde_json::from_str(&content).map_err(StoreError::Parse)?;
        Ok(Some(doc.into_subscribers(&self.default_list)))
    }

    /// Overwrites the document with `subscribers`.
    ///
    /// The document is serialized in full, written to a sibling temporary
    /// file and renamed into place, so readers never see a partial write.
    pub fn save(&self, subscribers: &Subscribers) -> Result<(), StoreError> {
        let doc = SubscriberDocument::from_subscribers(subscribers);
        let json = serde_json::to_string_pretty(&doc).map_err(StoreError::Serialize)?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(io_err(tmp.as_path()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(self.path.as_path())(e));
        }

        debug!("Saved {} subscribers to {}", subscribers.len(), self.path.display());
        Ok(())
    }

    /// Reloads the document under the store lock.
    pub async fn snapshot(&self) -> Result<Subscribers, StoreError> {
        let _guard = self.lock.lock().await;
        self.load()
    }

    /// Current record of a single user.
    pub async fn get(&self, user: UserId) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.snapshot().await?.remove(&user))
    }

    /// Runs a reload-mutate-save sequence under the store lock.
    ///
    /// The document is only written if `mutate` changed something. An
    /// `Err` means the change is not durable and must not be reported as
    /// done; if the document could not be read, `mutate` is not run.
    pub async fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Subscribers) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;

        let mut subscribers = self.load()?;
        let before = subscribers.clone();
        let result = mutate(&mut subscribers);

        if subscribers != before {
            self.save(&subscribers)?;
        }

        Ok(result)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
