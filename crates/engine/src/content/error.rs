use std::fmt;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    MissingField,
    InvalidValue,
    UnknownTileId,
    DuplicateTileId,
    DuplicateLevelName,
    UnknownDoorDestination,
    Callback,
    KeymapMalformed,
    EmptyLevel,
}

/// A content file that could not be loaded. Nothing from the failing file is
/// kept.
#[derive(Debug, Clone)]
pub struct ContentError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl ContentError {
    pub(crate) fn new(code: ContentErrorCode, message: String, file_path: &Path) -> Self {
        Self {
            code,
            message,
            file_path: file_path.to_path_buf(),
            location: None,
        }
    }

    pub(crate) fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentError {}

pub(crate) fn read_error(path: &Path, source: std::io::Error) -> ContentError {
    ContentError::new(
        ContentErrorCode::ReadFile,
        format!("failed to read file: {source}"),
        path,
    )
}

pub(crate) fn error_at_node(
    code: ContentErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ContentError {
    let pos = doc.text_pos_at(node.range().start);
    ContentError::new(code, message, file_path).at(pos.row as usize, pos.col as usize)
}
