use std::fmt::{self, Write};

use thiserror::Error;

use crate::element::tag::Tag;
use crate::element::{Element, ElementKind};
use crate::template::Template;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("block `{name}` includes itself")]
    RecursiveBlock { name: String },

    #[error("failed to write markup")]
    Write(#[from] fmt::Error),
}

impl Template {
    /// Render the inheritance-resolved tree to markup text.
    ///
    /// Rendering starts from the top of the super chain. Each `block <name>`
    /// placeholder takes the children of the most derived block of that name,
    /// looked up from `self` upwards, and renders nothing when no template in
    /// the chain overrides it.
    pub fn html(&self) -> Result<String, RenderError> {
        let mut renderer = Renderer {
            leaf: self,
            expanding: Vec::new(),
            out: String::new(),
        };
        for element in self.root().elements() {
            renderer.element(element)?;
        }
        Ok(renderer.out)
    }
}

struct Renderer<'a> {
    leaf: &'a Template,
    /// Names of the blocks currently being expanded.
    expanding: Vec<&'a str>,
    out: String,
}

impl<'a> Renderer<'a> {
    fn element(&mut self, element: &'a Element) -> Result<(), RenderError> {
        match element.kind {
            ElementKind::Comment => {}
            ElementKind::Doctype => {
                let doctype = element.content()["doctype".len()..].trim();
                let doctype = if doctype.is_empty() { "html" } else { doctype };
                write!(self.out, "<!DOCTYPE {}>", doctype)?;
            }
            ElementKind::Expression => self.out.push_str(element.content()),
            ElementKind::Text => self.text(element),
            ElementKind::Block => self.placeholder(element)?,
            ElementKind::Tag => match &element.tag {
                Some(tag) => self.tag(tag, element)?,
                None => self.out.push_str(element.content()),
            },
        }
        Ok(())
    }

    fn text(&mut self, element: &Element) {
        self.out.push_str(element.content());
        for child in &element.children {
            self.out.push('\n');
            self.text(child);
        }
    }

    fn placeholder(&mut self, element: &'a Element) -> Result<(), RenderError> {
        let Some(name) = element.block_name() else {
            return Ok(());
        };
        if self.expanding.contains(&name) {
            return Err(RenderError::RecursiveBlock {
                name: name.to_string(),
            });
        }
        let Some(block) = self.leaf.resolve_block(name) else {
            return Ok(());
        };
        self.expanding.push(name);
        for child in &block.children {
            self.element(child)?;
        }
        self.expanding.pop();
        Ok(())
    }

    fn tag(&mut self, tag: &Tag, element: &'a Element) -> Result<(), RenderError> {
        self.open_tag(tag)?;
        if VOID_TAGS.contains(&tag.name.as_str()) {
            return Ok(());
        }

        if tag.raw_content {
            let mut lines = Vec::new();
            if !tag.text.is_empty() {
                lines.push(tag.text.as_str());
            }
            for child in &element.children {
                collect_lines(child, &mut lines);
            }
            self.out.push_str(&lines.join("\n"));
        } else {
            self.out.push_str(&tag.text);
            for child in &element.children {
                self.element(child)?;
            }
        }

        write!(self.out, "</{}>", tag.name)?;
        Ok(())
    }

    fn open_tag(&mut self, tag: &Tag) -> fmt::Result {
        write!(self.out, "<{}", tag.name)?;
        if let Some(id) = &tag.id {
            write!(
                self.out,
                " id=\"{}\"",
                html_escape::encode_double_quoted_attribute(id)
            )?;
        }
        if !tag.classes.is_empty() {
            write!(
                self.out,
                " class=\"{}\"",
                html_escape::encode_double_quoted_attribute(&tag.classes.join(" "))
            )?;
        }
        for attribute in &tag.attributes {
            match &attribute.value {
                Some(value) => write!(
                    self.out,
                    " {}=\"{}\"",
                    attribute.name,
                    html_escape::encode_double_quoted_attribute(value)
                )?,
                None => write!(self.out, " {}", attribute.name)?,
            }
        }
        self.out.push('>');
        Ok(())
    }
}

fn collect_lines<'e>(element: &'e Element, lines: &mut Vec<&'e str>) {
    lines.push(element.content());
    for child in &element.children {
        collect_lines(child, lines);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::rc::Rc;

    use super::*;
    use crate::parser::{ParseError, Resolver, parse_template};

    struct NoSuper;

    impl Resolver for NoSuper {
        fn resolve(&mut self, path: &Path) -> Result<Rc<Template>, ParseError> {
            Err(ParseError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn html(source: &str) -> String {
        parse_template(Path::new("t.gold"), source, &mut NoSuper)
            .unwrap()
            .html()
            .unwrap()
    }

    #[test]
    fn nested_tags() {
        assert_eq!(
            html("doctype html\nhtml\n\tbody\n\t\th1#top.big Title\n\t\tbr"),
            r#"<!DOCTYPE html><html><body><h1 id="top" class="big">Title</h1><br></body></html>"#
        );
    }

    #[test]
    fn attributes_are_escaped() {
        assert_eq!(
            html(r#"a(href="/x?a=1&b=2" title=say"hi" hidden) Go"#),
            r#"<a href="/x?a=1&amp;b=2" title="say&quot;hi&quot;" hidden>Go</a>"#
        );
    }

    #[test]
    fn bare_doctype_and_void_tag_attributes() {
        assert_eq!(
            html("doctype\ninput#q.wide(type=\"text\" disabled)"),
            r#"<!DOCTYPE html><input id="q" class="wide" type="text" disabled>"#
        );
    }

    #[test]
    fn text_and_expressions() {
        assert_eq!(
            html("p\n\t| Hello,\n\t\tworld\n\t{{ name }}\n\t// hidden\n\t\tnot shown"),
            "<p>Hello,\nworld{{ name }}</p>"
        );
    }

    #[test]
    fn raw_content_keeps_lines() {
        assert_eq!(
            html("script.\n\tif (a) {\n\t\tb();\n\t}"),
            "<script>if (a) {\nb();\n}</script>"
        );
    }

    #[test]
    fn placeholder_without_override_renders_nothing() {
        assert_eq!(html("div\n\tblock content"), "<div></div>");
    }
}
