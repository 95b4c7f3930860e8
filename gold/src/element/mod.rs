pub mod tag;

use crate::container::Container;
use crate::element::tag::{ElementError, Tag};

/// Classification of a source line. Decides how the line renders and which
/// indentation rule its children follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Tag,
    /// Literal text: a `|` line, or any line nested under text or raw content.
    Text,
    /// `{{ ... }}` or `{% ... %}`, passed through to the template engine.
    Expression,
    Comment,
    Doctype,
    /// A `block name` placeholder in a template without a super template.
    /// Replaced at render time by the most derived override; never has children.
    Block,
}

/// What directly owns an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Template,
    Element,
    Block,
}

/// Indentation rule for the children of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Children must sit exactly one level deeper.
    Strict,
    /// Any deeper line is taken as a child.
    Loose,
    /// No deeper line is allowed.
    Forbidden,
}

impl ChildPolicy {
    pub fn new(raw_content: bool, kind: ElementKind) -> Self {
        if raw_content || kind == ElementKind::Text {
            ChildPolicy::Loose
        } else if kind == ElementKind::Block {
            ChildPolicy::Forbidden
        } else {
            ChildPolicy::Strict
        }
    }
}

/// One line of markup and the lines nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub text: String,
    /// 1-based.
    pub line_no: usize,
    pub indent: usize,
    pub kind: ElementKind,
    pub raw_content: bool,
    pub parent: Parent,
    pub tag: Option<Tag>,
    pub children: Vec<Element>,
}

impl Element {
    /// Build an element from a source line.
    ///
    /// `context` is the kind and raw flag of the parent element, if any: lines
    /// under raw content or text are text themselves regardless of how they look.
    pub fn new(
        line: &str,
        line_no: usize,
        indent: usize,
        parent: Parent,
        context: Option<(ElementKind, bool)>,
    ) -> Result<Element, ElementError> {
        let trimmed = line.trim();
        let mut tag = None;
        let mut raw_content = false;

        let kind = match context {
            Some((_, true)) => {
                raw_content = true;
                ElementKind::Text
            }
            Some((ElementKind::Text, false)) => ElementKind::Text,
            _ => {
                let kind = classify(trimmed);
                match kind {
                    ElementKind::Tag => {
                        let parsed = Tag::parse(trimmed)?;
                        raw_content = parsed.raw_content;
                        tag = Some(parsed);
                    }
                    ElementKind::Comment => raw_content = true,
                    _ => {}
                }
                kind
            }
        };

        Ok(Element {
            text: line.to_string(),
            line_no,
            indent,
            kind,
            raw_content,
            parent,
            tag,
            children: Vec::new(),
        })
    }

    pub fn child_policy(&self) -> ChildPolicy {
        ChildPolicy::new(self.raw_content, self.kind)
    }

    /// The line's content with indentation and any `|` marker removed.
    pub fn content(&self) -> &str {
        let trimmed = self.text.trim();
        if self.kind == ElementKind::Text && !self.raw_content {
            if let Some(rest) = trimmed.strip_prefix('|') {
                return rest.strip_prefix(' ').unwrap_or(rest);
            }
        }
        trimmed
    }

    /// Block name of a placeholder element.
    pub fn block_name(&self) -> Option<&str> {
        if self.kind != ElementKind::Block {
            return None;
        }
        self.text.trim().split(' ').nth(1).filter(|name| !name.is_empty())
    }
}

impl Container for Element {
    fn append_child(&mut self, child: Element) {
        self.children.push(child);
    }

    fn child_context(&self) -> Option<(ElementKind, bool)> {
        Some((self.kind, self.raw_content))
    }

    fn as_parent(&self) -> Parent {
        Parent::Element
    }
}

fn classify(trimmed: &str) -> ElementKind {
    if trimmed.starts_with('|') {
        ElementKind::Text
    } else if trimmed.starts_with("//") {
        ElementKind::Comment
    } else if trimmed.starts_with("{{") || trimmed.starts_with("{%") {
        ElementKind::Expression
    } else if trimmed == "doctype" || trimmed.starts_with("doctype ") {
        ElementKind::Doctype
    } else if crate::line::is_block(trimmed) {
        ElementKind::Block
    } else {
        ElementKind::Tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(line: &str) -> Element {
        Element::new(line, 1, 0, Parent::Template, None).unwrap()
    }

    #[test]
    fn classification() {
        assert_eq!(element("| hi").kind, ElementKind::Text);
        assert_eq!(element("// note").kind, ElementKind::Comment);
        assert_eq!(element("{{ title }}").kind, ElementKind::Expression);
        assert_eq!(element("{% if x %}").kind, ElementKind::Expression);
        assert_eq!(element("doctype html").kind, ElementKind::Doctype);
        assert_eq!(element("block greeting").kind, ElementKind::Block);
        assert_eq!(element("blockquote").kind, ElementKind::Tag);
        assert_eq!(element("div.a").kind, ElementKind::Tag);
    }

    #[test]
    fn raw_flags() {
        assert!(element("script.").raw_content);
        assert!(element("// gone").raw_content);
        assert!(!element("script").raw_content);
        assert!(!element("| text").raw_content);
    }

    #[test]
    fn policies() {
        assert_eq!(element("div").child_policy(), ChildPolicy::Strict);
        assert_eq!(element("style.").child_policy(), ChildPolicy::Loose);
        assert_eq!(element("| a").child_policy(), ChildPolicy::Loose);
        assert_eq!(element("block a").child_policy(), ChildPolicy::Forbidden);
    }

    #[test]
    fn lines_under_raw_content_are_verbatim_text() {
        let e = Element::new(
            "    p.not-a-tag",
            2,
            2,
            Parent::Element,
            Some((ElementKind::Tag, true)),
        )
        .unwrap();
        assert_eq!(e.kind, ElementKind::Text);
        assert!(e.raw_content);
        assert!(e.tag.is_none());
        assert_eq!(e.content(), "p.not-a-tag");
    }

    #[test]
    fn lines_under_text_are_text() {
        let e = Element::new("  | more", 2, 1, Parent::Element, Some((ElementKind::Text, false)))
            .unwrap();
        assert_eq!(e.kind, ElementKind::Text);
        assert_eq!(e.content(), "more");
    }

    #[test]
    fn block_placeholder_name() {
        assert_eq!(element("block greeting").block_name(), Some("greeting"));
        assert_eq!(element("block").block_name(), None);
        assert_eq!(element("div").block_name(), None);
    }

    #[test]
    fn tag_errors_surface() {
        assert_eq!(
            Element::new("a(href=x", 1, 0, Parent::Template, None),
            Err(ElementError::UnclosedAttributes)
        );
    }
}
