//! Word lists backed by `<name>.txt` files in a directory.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// File extension of word-list files.
pub const WORDLIST_EXTENSION: &str = "txt";

/// Placeholder returned when none of the requested lists has any words.
pub const SENTINEL_WORD: &str = "(no words available yet)";

/// Errors that can occur while reading a word list.
#[derive(Debug, Error)]
pub enum WordListError {
    #[error("Invalid word list name: '{0}'")]
    InvalidName(String),

    #[error("Failed to read word list '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Word list '{0}' is empty")]
    Empty(String),
}

/// Read-only access to the word lists in a directory.
///
/// Lists are read on first use and cached until [`WordListStore::reload`].
#[derive(Debug)]
pub struct WordListStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<Vec<String>>>>,
}

impl WordListStore {
    /// Creates a store over the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Names of all list files in the directory.
    ///
    /// Returns an empty set if the directory cannot be read.
    #[must_use]
    pub fn list_available_names(&self) -> BTreeSet<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read word list directory {}: {}", self.dir.display(), e);
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == WORDLIST_EXTENSION))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_owned))
            .collect()
    }

    /// Loads the named lists and concatenates their words in the given order.
    ///
    /// Missing or empty lists are skipped. If nothing is left, a single
    /// sentinel word is returned so callers always have something to pick.
    pub async fn load(&self, names: &[String]) -> Vec<String> {
        let mut words = Vec::new();

        for name in names {
            match self.load_list(name).await {
                Ok(list) => words.extend(list.iter().cloned()),
                Err(e) => warn!("Skipping word list: {}", e),
            }
        }

        if words.is_empty() {
            debug!("No words found in {:?}, using sentinel", names);
            words.push(SENTINEL_WORD.to_owned());
        }

        words
    }

    /// Loads a single list, consulting the cache first.
    pub async fn load_list(&self, name: &str) -> Result<Arc<Vec<String>>, WordListError> {
        if let Some(list) = self.cache.read().await.get(name) {
            return Ok(Arc::clone(list));
        }

        let path = self.path_for(name)?;
        let content = std::fs::read_to_string(&path).map_err(|source| WordListError::Io {
            name: name.to_owned(),
            source,
        })?;

        let words = parse_words(&content);
        if words.is_empty() {
            return Err(WordListError::Empty(name.to_owned()));
        }

        debug!("Loaded {} words from list '{}'", words.len(), name);
        let list = Arc::new(words);
        self.cache
            .write()
            .await
            .insert(name.to_owned(), Arc::clone(&list));
        Ok(list)
    }

    /// Number of words in a list, or `None` if it cannot be loaded.
    pub async fn word_count(&self, name: &str) -> Option<usize> {
        self.load_list(name).await.ok().map(|list| list.len())
    }

    /// The first `limit` words of a list along with its total size.
    pub async fn preview(&self, name: &str, limit: usize) -> Option<(usize, Vec<String>)> {
        let list = self.load_list(name).await.ok()?;
        Some((list.len(), list.iter().take(limit).cloned().collect()))
    }

    /// Drops all cached lists and rescans the directory.
    pub async fn reload(&self) -> BTreeSet<String> {
        self.cache.write().await.clear();
        let names = self.list_available_names();
        info!("Word lists reloaded: {} available", names.len());
        names
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, WordListError> {
        if !is_valid_name(name) {
            return Err(WordListError::InvalidName(name.to_owned()));
        }
        Ok(self.dir.join(format!("{name}.{WORDLIST_EXTENSION}")))
    }
}

/// A list name must be a plain file stem.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Splits file content into trimmed, non-blank lines.
fn parse_words(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write_list(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(format!("{name}.txt")), content).unwrap();
    }

    #[test]
    fn test_parse_words_trims_and_skips_blank_lines() {
        assert_eq!(
            parse_words("  alpha \n\n\tbeta\n   \ngamma"),
            vec!["alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn test_list_available_names_only_txt() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "words", "a");
        write_list(dir.path(), "fenia", "b");
        std::fs::write(dir.path().join("notes.md"), "c").unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let store = WordListStore::new(dir.path());
        let names: Vec<_> = store.list_available_names().into_iter().collect();
        assert_eq!(names, vec!["fenia", "words"]);
    }

    #[test]
    fn test_list_available_names_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordListStore::new(dir.path().join("absent"));
        assert!(store.list_available_names().is_empty());
    }

    #[tokio::test]
    async fn test_load_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "first", "one\ntwo\n");
        write_list(dir.path(), "second", "three\n");

        let store = WordListStore::new(dir.path());
        let words = store
            .load(&["second".to_owned(), "first".to_owned()])
            .await;
        assert_eq!(words, vec!["three", "one", "two"]);
    }

    #[tokio::test]
    async fn test_load_skips_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "words", "only\n");

        let store = WordListStore::new(dir.path());
        let words = store.load(&["ghost".to_owned(), "words".to_owned()]).await;
        assert_eq!(words, vec!["only"]);
    }

    #[tokio::test]
    async fn test_load_missing_or_empty_yields_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "blank", "\n   \n");

        let store = WordListStore::new(dir.path());
        assert_eq!(store.load(&["ghost".to_owned()]).await, vec![SENTINEL_WORD]);
        assert_eq!(store.load(&["blank".to_owned()]).await, vec![SENTINEL_WORD]);
        assert_eq!(store.load(&[]).await, vec![SENTINEL_WORD]);
    }

    #[tokio::test]
    async fn test_load_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = WordListStore::new(dir.path());
        assert!(matches!(
            store.load_list("../secret").await,
            Err(WordListError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_survives_until_reload() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "words", "old\n");

        let store = WordListStore::new(dir.path());
        assert_eq!(store.word_count("words").await, Some(1));

        write_list(dir.path(), "words", "new\nnewer\n");
        assert_eq!(store.word_count("words").await, Some(1));

        let names = store.reload().await;
        assert!(names.contains("words"));
        assert_eq!(store.word_count("words").await, Some(2));
    }

    #[tokio::test]
    async fn test_preview() {
        let dir = tempfile::tempdir().unwrap();
        write_list(dir.path(), "words", "a\nb\nc\n");

        let store = WordListStore::new(dir.path());
        let (total, sample) = store.preview("words", 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(sample, vec!["a", "b"]);
        assert!(store.preview("ghost", 2).await.is_none());
    }
}
