//! Random Word Bot Library
//!
//! A Telegram bot that periodically sends each subscriber a random word
//! from the word lists they chose.
//!
//! This crate provides the core functionality for:
//! - Reading word lists from a directory of text files
//! - Persisting subscribers and their list choices in a JSON document
//! - Deciding when a subscriber is due and delivering words
//! - Handling user commands via chat messages

pub mod commands;
pub mod config;
pub mod delivery;
pub mod subscribers;
pub mod telegram;
pub mod wordlist;
