pub mod error;
pub(crate) mod tree;

pub use error::ParseError;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::block::Block;
use crate::element::{ChildPolicy, Element, Parent};
use crate::line;
use crate::parser::tree::{Cursor, append_children};
use crate::template::{Template, TemplateBuilder};

/// Extension appended to `extends` targets.
pub const EXTENSION: &str = ".gold";

const DIRECTIVE_TOKENS: usize = 2;

/// Loads the super template named by an `extends` directive.
pub trait Resolver {
    fn resolve(&mut self, path: &Path) -> Result<Rc<Template>, ParseError>;
}

/// Parse the newline-normalized `source` of the file at `path`.
pub fn parse_template<R: Resolver + ?Sized>(
    path: &Path,
    source: &str,
    resolver: &mut R,
) -> Result<Rc<Template>, ParseError> {
    let mut builder = TemplateBuilder::new(path);
    let mut cursor = Cursor::new(path, source);

    while let Some(text) = cursor.peek() {
        let line_no = cursor.line_no();
        cursor.advance();
        if line::is_blank(text) || !line::is_top_level(text) {
            continue;
        }

        if line::is_extends(text) {
            let target = directive_argument(text, line_no, path)?;
            let super_path = builder.dir().join(format!("{target}{EXTENSION}"));
            debug!(template = %path.display(), target = %super_path.display(), "resolving extends");
            let parent = resolver.resolve(&super_path)?;
            builder.set_super(parent);
        } else if builder.has_super() && line::is_block(text) {
            let name = directive_argument(text, line_no, path)?;
            trace!(template = %path.display(), block = name, "registering block");
            let mut block = Block::new(name, builder.path());
            append_children(&mut block, &mut cursor, 0, ChildPolicy::Strict)?;
            builder.add_block(block);
        } else {
            let mut element = Element::new(text, line_no, 0, Parent::Template, None).map_err(
                |source| ParseError::Element {
                    path: path.to_path_buf(),
                    line: line_no,
                    source,
                },
            )?;
            let policy = element.child_policy();
            append_children(&mut element, &mut cursor, 0, policy)?;
            builder.append_element(element);
        }
    }

    Ok(builder.finish())
}

/// Second token of an `extends` or `block` line.
fn directive_argument<'l>(text: &'l str, line_no: usize, path: &Path) -> Result<&'l str, ParseError> {
    let tokens = line::directive_tokens(text);
    if tokens.len() != DIRECTIVE_TOKENS {
        return Err(ParseError::TokenCount {
            path: PathBuf::from(path),
            expected: DIRECTIVE_TOKENS,
            actual: tokens.len(),
            line: line_no,
        });
    }
    Ok(tokens[1])
}
