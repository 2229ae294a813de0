//! Standalone word-list cleaner.
//!
//! Turns a raw dictionary dump (wrapped entries, page numbers, section
//! letters) into a one-entry-per-line file the bot can read as a word list.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use random_word_bot::wordlist::{WORDLIST_EXTENSION, clean_wordlist};

/// Word-list cleaner.
#[derive(Parser, Debug)]
#[command(name = "clean_wordlist")]
#[command(about = "Cleans a raw dictionary dump into a word-list file")]
#[command(version)]
struct Args {
    /// Raw input file.
    input: PathBuf,

    /// Output file (defaults to `<input>_cleaned.txt` next to the input).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    let raw = match std::fs::read_to_string(&args.input) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("✗ Failed to read {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let cleaned = clean_wordlist(&raw);
    let entries = cleaned.lines().count();

    match std::fs::write(&output, cleaned) {
        Ok(()) => {
            println!("✓ Wrote {entries} entries to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write {}: {e}", output.display());
            ExitCode::FAILURE
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "wordlist".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_cleaned.{WORDLIST_EXTENSION}"))
}
