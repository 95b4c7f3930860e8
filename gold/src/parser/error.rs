use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::element::tag::ElementError;

/// Errors raised while reading and parsing a template file.
///
/// Every variant names the file it occurred in, so an error coming out of an
/// `extends` target reaches the caller unwrapped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "{}: the line tokens length is invalid (expected: {expected}, actual: {actual}, line no: {line})",
        path.display()
    )]
    TokenCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
        line: usize,
    },

    #[error("{}: the indent of the line {line} is invalid", path.display())]
    Indentation { path: PathBuf, line: usize },

    #[error(
        "{}: the indent of the line {line} is invalid, block element can not have child elements",
        path.display()
    )]
    BlockChildren { path: PathBuf, line: usize },

    #[error("{}: line {line}: {source}", path.display())]
    Element {
        path: PathBuf,
        line: usize,
        #[source]
        source: ElementError,
    },

    #[error("{}: cyclic extends chain: {}", path.display(), format_chain(chain))]
    CyclicExtends { path: PathBuf, chain: Vec<PathBuf> },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ParseError {
    /// File the error occurred in.
    pub fn path(&self) -> &Path {
        match self {
            ParseError::Io { path, .. }
            | ParseError::TokenCount { path, .. }
            | ParseError::Indentation { path, .. }
            | ParseError::BlockChildren { path, .. }
            | ParseError::Element { path, .. }
            | ParseError::CyclicExtends { path, .. } => path,
        }
    }

    /// 1-based line number, for errors tied to a line.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::TokenCount { line, .. }
            | ParseError::Indentation { line, .. }
            | ParseError::BlockChildren { line, .. }
            | ParseError::Element { line, .. } => Some(*line),
            ParseError::Io { .. } | ParseError::CyclicExtends { .. } => None,
        }
    }

    /// Convert to a codespan-reporting Diagnostic labelled on the offending
    /// line of `source`, the text of [`ParseError::path`].
    pub fn to_diagnostic(&self, file_id: usize, source: &str) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::error().with_message(self.to_string());
        match self.line().and_then(|line| line_span(source, line)) {
            Some(span) => diagnostic.with_labels(vec![Label::primary(file_id, span)]),
            None => diagnostic,
        }
    }
}

/// Byte range of the 1-based `line` in `source`, without its newline.
pub fn line_span(source: &str, line: usize) -> Option<Range<usize>> {
    let mut start = 0;
    for (index, text) in source.split('\n').enumerate() {
        if index + 1 == line {
            return Some(start..start + text.len());
        }
        start += text.len() + 1;
    }
    None
}
