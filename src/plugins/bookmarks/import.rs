//! CSV bookmark import.
//!
//! Fixed ingestion format: each line holds exactly five double-quoted fields,
//! `"url";"title";"description";"folder";"tags"`, with tags comma-separated
//! inside their quoted field. Lines that do not yield exactly five quoted
//! groups, or that lack a url or title, are skipped silently. Imports larger
//! than [`MAX_IMPORT_ROWS`] parsed rows are rejected whole.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Hard limit on rows accepted by a single import.
pub const MAX_IMPORT_ROWS: usize = 100;

static QUOTED_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("quoted-field pattern is valid"));

/// One parsed import row, not yet submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkImport {
    pub url: String,
    pub title: String,
    pub description: String,
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Maximum {MAX_IMPORT_ROWS} bookmarks allowed per import (got {0})")]
    TooManyRows(usize),
}

/// Parses CSV content into import rows, skipping malformed lines.
pub fn parse_csv(content: &str) -> Vec<BookmarkImport> {
    let mut bookmarks = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = QUOTED_FIELD
            .captures_iter(line)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        if fields.len() != 5 {
            continue;
        }

        let (url, title, description, folder, tags) =
            (fields[0], fields[1], fields[2], fields[3], fields[4]);
        if url.is_empty() || title.is_empty() {
            continue;
        }

        bookmarks.push(BookmarkImport {
            url: url.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            folder: if folder.is_empty() {
                None
            } else {
                Some(folder.to_string())
            },
            tags: tags
                .split(',')
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(|tag| tag.to_string())
                .collect(),
        });
    }

    bookmarks
}

/// Parses and enforces the row limit. The whole import is refused when more
/// than [`MAX_IMPORT_ROWS`] rows parse; nothing is partially accepted.
pub fn parse_csv_limited(content: &str) -> Result<Vec<BookmarkImport>, ImportError> {
    let bookmarks = parse_csv(content);
    if bookmarks.len() > MAX_IMPORT_ROWS {
        return Err(ImportError::TooManyRows(bookmarks.len()));
    }
    Ok(bookmarks)
}
