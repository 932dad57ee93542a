//! Inline keyboard files
//!
//! A keyboard is written in RON, one list per row:
//!
//! ```ron
//! (
//!     rows: [
//!         [(text: "Read more", url: Some("https://example.com/news"))],
//!         [(text: "Unsubscribe", callback_data: Some("unsubscribe"))],
//!     ],
//! )
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use herald_broadcast::InlineKeyboard;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Failed to read markup from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse markup from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("Button {text:?} needs exactly one of url or callback_data")]
    Button { text: String },
}

/// Read an inline keyboard from a RON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not describe a keyboard,
/// or has a button with neither or both of `url` and `callback_data`.
pub fn read(path: &Path) -> Result<InlineKeyboard, MarkupError> {
    let content = std::fs::read_to_string(path).map_err(|source| MarkupError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let keyboard: InlineKeyboard = ron::from_str(&content).map_err(|source| MarkupError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(button) = keyboard
        .rows
        .iter()
        .flatten()
        .find(|button| button.url.is_some() == button.callback_data.is_some())
    {
        return Err(MarkupError::Button {
            text: button.text.clone(),
        });
    }

    Ok(keyboard)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use herald_broadcast::InlineButton;
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_keyboard() {
        let file = write(
            r#"(
                rows: [
                    [
                        (text: "Read more", url: Some("https://example.com/news")),
                        (text: "Later", callback_data: Some("snooze")),
                    ],
                    [(text: "Unsubscribe", callback_data: Some("unsubscribe"))],
                ],
            )"#,
        );

        assert_eq!(
            read(file.path()).unwrap(),
            InlineKeyboard {
                rows: vec![
                    vec![
                        InlineButton::url("Read more", "https://example.com/news"),
                        InlineButton::callback("Later", "snooze"),
                    ],
                    vec![InlineButton::callback("Unsubscribe", "unsubscribe")],
                ],
            }
        );
    }

    #[test]
    fn test_rejects_button_without_action() {
        let file = write(r#"(rows: [[(text: "Nothing")]])"#);
        let err = read(file.path()).unwrap_err();
        assert!(matches!(err, MarkupError::Button { ref text } if text == "Nothing"), "{err:?}");
    }

    #[test]
    fn test_rejects_malformed_file() {
        let file = write("rows: [");
        assert!(matches!(read(file.path()).unwrap_err(), MarkupError::Parse { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, MarkupError::Read { .. }));
    }
}
