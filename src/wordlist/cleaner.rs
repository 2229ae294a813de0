//! Cleanup of raw dictionary dumps into one-entry-per-line word lists.
//!
//! Input is typically text extracted from a scanned dictionary: entries
//! wrap across lines, page numbers and section letters sit on lines of
//! their own. Each entry is expected to start with an uppercase letter.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)]
static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\d+\n").unwrap());

#[allow(clippy::unwrap_used)]
static SECTION_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[A-ZА-ЯЁ]\n").unwrap());

#[allow(clippy::unwrap_used)]
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Cleans a raw dump into a newline-separated list of entries.
#[must_use]
pub fn clean_wordlist(raw: &str) -> String {
    let content = raw.replace("\r\n", "\n");
    let content = PAGE_NUMBER.replace_all(&content, "\n");
    let content = SECTION_LETTER.replace_all(&content, "\n");
    let content = join_continuations(&content);
    let content = BLANK_LINES.replace_all(&content, "\n");
    content.trim().to_owned()
}

/// Replaces every newline not followed by an entry start with a space.
fn join_continuations(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' && !chars.peek().copied().is_some_and(starts_entry) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }

    out
}

fn starts_entry(c: char) -> bool {
    c.is_ascii_uppercase() || ('А'..='Я').contains(&c) || c == 'Ё'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_wrapped_entries() {
        let raw = "Абзац – часть текста,\nначинающаяся с новой строки\nБаза – основа";
        assert_eq!(
            clean_wordlist(raw),
            "Абзац – часть текста, начинающаяся с новой строки\nБаза – основа"
        );
    }

    #[test]
    fn test_drops_page_numbers_and_section_letters() {
        let raw = "Alpha one\n12\nB\nBeta two\n";
        assert_eq!(clean_wordlist(raw), "Alpha one\nBeta two");
    }

    #[test]
    fn test_blank_lines_become_spaces_inside_entries() {
        let raw = "Alpha\n\nbeta\nGamma";
        assert_eq!(clean_wordlist(raw), "Alpha  beta\nGamma");
    }

    #[test]
    fn test_trims_and_normalises_crlf() {
        let raw = "  \r\nAlpha\r\nBeta  \r\n";
        assert_eq!(clean_wordlist(raw), "Alpha\nBeta");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_wordlist(""), "");
    }
}
