//! Typed errors for scraping and storage.
//!
//! Scrape errors never leave a site scraper; storage errors are surfaced to
//! the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scraping one site
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Browser could not be launched or a tab could not be opened
    #[error("browser error: {0}")]
    Browser(String),

    /// Page did not load within the navigation timeout
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Plain HTTP fetch failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A click or element read failed
    #[error("interaction with '{selector}' failed: {reason}")]
    Interaction { selector: String, reason: String },

    /// No extraction strategy found floor plan data
    #[error("no floor plan structure found on {site}")]
    NoStructure { site: String },

    /// The active page driver cannot perform the operation
    #[error("{operation} is not supported by the {driver} driver")]
    Unsupported {
        operation: &'static str,
        driver: &'static str,
    },

    /// Blocking scrape task panicked or was cancelled
    #[error("scrape task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors reading or writing JSON snapshots
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Retention window that is not a positive number of days, or reaches past the calendar
    #[error("retention of {keep_days} days is out of range")]
    Retention { keep_days: i64 },
}
