//! Recipient list files
//!
//! One chat id per line. Blank lines are skipped and `#` starts a comment that
//! runs to the end of the line.

use std::{
    io,
    num::ParseIntError,
    path::{Path, PathBuf},
};

use herald_broadcast::RecipientId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipientsError {
    #[error("Failed to read recipients from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid recipient on line {line}: {content:?}")]
    Invalid {
        line: usize,
        content: String,
        #[source]
        source: ParseIntError,
    },
}

/// Parse a recipient list, keeping duplicates and file order.
///
/// # Errors
///
/// Returns [`RecipientsError::Invalid`] for the first line that is not a chat id.
pub fn parse(input: &str) -> Result<Vec<RecipientId>, RecipientsError> {
    input
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let content = line.split_once('#').map_or(line, |(before, _)| before).trim();
            (!content.is_empty()).then_some((index + 1, content))
        })
        .map(|(line, content)| {
            content
                .parse()
                .map_err(|source| RecipientsError::Invalid {
                    line,
                    content: content.to_owned(),
                    source,
                })
        })
        .collect()
}

/// Read and parse a recipient list file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains an invalid line.
pub fn read(path: &Path) -> Result<Vec<RecipientId>, RecipientsError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecipientsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&content)
}
