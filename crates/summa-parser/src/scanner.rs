//! The multi-file journal scanner.
//!
//! A [`Scanner`] keeps a stack of open files. `include` pushes a file on
//! top; when the top file runs out it is closed and popped, and reading
//! resumes in the includer. Every line is tagged with its *originating*
//! file and line number so diagnostics stay accurate across includes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ParseError;

/// One line of journal text, with provenance.
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// The file this line came from.
    pub file: Arc<PathBuf>,
    /// 1-based line number within that file.
    pub number: u32,
    /// The line text, without the trailing newline.
    pub text: String,
}

impl SourceLine {
    /// The file path as a displayable string.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file.display().to_string()
    }
}

struct OpenFile {
    reader: BufReader<File>,
    path: Arc<PathBuf>,
    line: u32,
}

/// A stack of open journal files.
#[derive(Default)]
pub struct Scanner {
    files: Vec<OpenFile>,
}

impl Scanner {
    /// Create a scanner with no open files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file and push it on top of the stack.
    ///
    /// A non-absolute path is resolved relative to the directory of the
    /// file currently on top, so includes work from anywhere.
    pub fn push(&mut self, path: &Path) -> Result<(), ParseError> {
        let resolved = match self.files.last() {
            Some(top) if path.is_relative() => top
                .path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(path),
            _ => path.to_path_buf(),
        };
        let file = File::open(&resolved).map_err(|source| ParseError::Io {
            path: resolved.clone(),
            source,
        })?;
        self.files.push(OpenFile {
            reader: BufReader::new(file),
            path: Arc::new(resolved),
            line: 0,
        });
        Ok(())
    }

    /// The next line, popping finished files; `None` when every file is
    /// exhausted.
    pub fn next_line(&mut self) -> Result<Option<SourceLine>, ParseError> {
        loop {
            let Some(top) = self.files.last_mut() else {
                return Ok(None);
            };
            let mut text = String::new();
            let read = top
                .reader
                .read_line(&mut text)
                .map_err(|source| ParseError::Io {
                    path: top.path.as_ref().clone(),
                    source,
                })?;
            if read == 0 {
                self.files.pop();
                continue;
            }
            top.line += 1;
            while text.ends_with('\n') || text.ends_with('\r') {
                text.pop();
            }
            return Ok(Some(SourceLine {
                file: top.path.clone(),
                number: top.line,
                text,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_single_file_lines_and_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.journal");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let mut scanner = Scanner::new();
        scanner.push(&path).unwrap();

        let mut seen = Vec::new();
        while let Some(line) = scanner.next_line().unwrap() {
            seen.push((line.number, line.text));
        }
        assert_eq!(
            seen,
            vec![
                (1, "one".to_string()),
                (2, "two".to_string()),
                (3, "three".to_string())
            ]
        );
    }

    #[test]
    fn test_include_is_depth_first_with_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();

        let mut inner = File::create(sub.join("inner.journal")).unwrap();
        writeln!(inner, "inner-1").unwrap();
        writeln!(inner, "inner-2").unwrap();

        let outer_path = dir.path().join("outer.journal");
        let mut outer = File::create(&outer_path).unwrap();
        writeln!(outer, "outer-1").unwrap();
        writeln!(outer, "outer-2").unwrap();

        let mut scanner = Scanner::new();
        scanner.push(&outer_path).unwrap();

        let first = scanner.next_line().unwrap().unwrap();
        assert_eq!(first.text, "outer-1");

        // Relative include resolves against the directory of the top file.
        scanner.push(Path::new("sub/inner.journal")).unwrap();

        let line = scanner.next_line().unwrap().unwrap();
        assert_eq!(line.text, "inner-1");
        assert!(line.file_name().ends_with("inner.journal"));
        assert_eq!(line.number, 1);

        assert_eq!(scanner.next_line().unwrap().unwrap().text, "inner-2");

        // Inner file exhausted: reading resumes in the includer.
        let back = scanner.next_line().unwrap().unwrap();
        assert_eq!(back.text, "outer-2");
        assert!(back.file_name().ends_with("outer.journal"));
        assert_eq!(back.number, 2);

        assert!(scanner.next_line().unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut scanner = Scanner::new();
        let err = scanner.push(Path::new("/no/such/journal")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
