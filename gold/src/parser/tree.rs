use std::path::Path;

use crate::container::Container;
use crate::element::{ChildPolicy, Element};
use crate::line;
use crate::parser::error::ParseError;

/// Position in the line array of one source file.
pub(crate) struct Cursor<'a> {
    path: &'a Path,
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(path: &'a Path, source: &'a str) -> Self {
        Cursor {
            path,
            lines: source.split('\n').collect(),
            pos: 0,
        }
    }

    pub(crate) fn path(&self) -> &'a Path {
        self.path
    }

    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// 1-based number of the line under the cursor.
    pub(crate) fn line_no(&self) -> usize {
        self.pos + 1
    }

    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Consume the lines nested under `parent` and attach them as its children.
///
/// Stops at the first non-blank line that is not indented past
/// `parent_indent`, leaving the cursor on it.
pub(crate) fn append_children<C: Container>(
    parent: &mut C,
    cursor: &mut Cursor<'_>,
    parent_indent: usize,
    policy: ChildPolicy,
) -> Result<(), ParseError> {
    while let Some(text) = cursor.peek() {
        if line::is_blank(text) {
            cursor.advance();
            continue;
        }

        let indent = line::indent_depth(text);
        if indent < parent_indent + 1 {
            return Ok(());
        }

        match policy {
            ChildPolicy::Loose => append_child(parent, text, indent, cursor)?,
            ChildPolicy::Forbidden => {
                return Err(ParseError::BlockChildren {
                    path: cursor.path().to_path_buf(),
                    line: cursor.line_no(),
                });
            }
            ChildPolicy::Strict if indent == parent_indent + 1 => {
                append_child(parent, text, indent, cursor)?
            }
            ChildPolicy::Strict => {
                return Err(ParseError::Indentation {
                    path: cursor.path().to_path_buf(),
                    line: cursor.line_no(),
                });
            }
        }
    }
    Ok(())
}

fn append_child<C: Container>(
    parent: &mut C,
    text: &str,
    indent: usize,
    cursor: &mut Cursor<'_>,
) -> Result<(), ParseError> {
    let line_no = cursor.line_no();
    let mut child = Element::new(
        text,
        line_no,
        indent,
        parent.as_parent(),
        parent.child_context(),
    )
    .map_err(|source| ParseError::Element {
        path: cursor.path().to_path_buf(),
        line: line_no,
        source,
    })?;
    cursor.advance();

    let policy = child.child_policy();
    append_children(&mut child, cursor, indent, policy)?;
    parent.append_child(child);
    Ok(())
}
