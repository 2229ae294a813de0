//! Word lists: the on-disk store the bot picks words from, and the
//! offline cleaner that produces list files from raw dictionary dumps.

mod cleaner;
mod store;

pub use cleaner::clean_wordlist;
pub use store::{SENTINEL_WORD, WORDLIST_EXTENSION, WordListError, WordListStore, is_valid_name};
