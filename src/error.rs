// plans10x/src/error.rs

//! Error types for plan conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plan conversion operations.
pub type Result<T> = std::result::Result<T, Plans10xError>;

/// Errors that can occur while reading, transforming, or writing plan files.
///
/// There is no recovery path: the batch converter aborts on the first
/// failure, so every variant is terminal.
#[derive(Debug, Error)]
pub enum Plans10xError {
    /// I/O error when reading or writing files. `fs-err` annotates the
    /// message with the offending path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML encountered by the reader or writer.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute inside an element tag.
    #[error("malformed XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// The serialized output was not valid UTF-8.
    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A file-level wrapper that attaches the source path to whatever
    /// went wrong underneath.
    #[error("failed to convert {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Plans10xError>,
    },
}

impl Plans10xError {
    /// Attach a source file path to this error.
    pub fn for_file<P: Into<PathBuf>>(self, path: P) -> Self {
        Plans10xError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_wrapper_display() {
        let inner = Plans10xError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = inner.for_file("plans/station.xml");
        let msg = err.to_string();
        assert!(msg.contains("plans/station.xml"));
        assert!(msg.starts_with("failed to convert"));
    }
}
