use thiserror::Error;

/// Problems found while reading a tag line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("attribute list is not closed")]
    UnclosedAttributes,
    #[error("attribute value is missing a closing quote")]
    UnclosedQuote,
    #[error("attribute name is empty")]
    EmptyAttributeName,
}

/// A single `name` or `name=value` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// The parsed form of a tag line: `selector[(attributes)][ text]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<Attribute>,
    /// Text following the selector and attribute list on the same line.
    pub text: String,
    /// Set by a trailing `.` on the selector, e.g. `script.`.
    pub raw_content: bool,
}

impl Tag {
    /// Parse a trimmed tag line.
    pub fn parse(line: &str) -> Result<Tag, ElementError> {
        let selector_end = line.find([' ', '(']).unwrap_or(line.len());
        let (selector, mut rest) = line.split_at(selector_end);

        let (selector, raw_content) = match selector.strip_suffix('.') {
            Some(s) => (s, true),
            None => (selector, false),
        };
        let (name, id, classes) = parse_selector(selector);

        let mut attributes = Vec::new();
        if let Some(after_open) = rest.strip_prefix('(') {
            let close = find_closing_paren(after_open)?;
            attributes = parse_attributes(&after_open[..close])?;
            rest = &after_open[close + 1..];
        }

        Ok(Tag {
            name,
            id,
            classes,
            attributes,
            text: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
            raw_content,
        })
    }
}

fn parse_selector(selector: &str) -> (String, Option<String>, Vec<String>) {
    let name_end = selector.find(['#', '.']).unwrap_or(selector.len());
    let name = match &selector[..name_end] {
        "" => "div".to_string(),
        n => n.to_string(),
    };

    let mut id = None;
    let mut classes = Vec::new();
    let mut remaining = &selector[name_end..];
    while let Some(marker) = remaining.chars().next() {
        let body = &remaining[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let value = &body[..end];
        if !value.is_empty() {
            if marker == '#' {
                id = Some(value.to_string());
            } else {
                classes.push(value.to_string());
            }
        }
        remaining = &body[end..];
    }
    (name, id, classes)
}

/// Byte offset of the `)` closing an attribute list, honouring quotes.
fn find_closing_paren(s: &str) -> Result<usize, ElementError> {
    let mut in_quote = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            ')' if !in_quote => return Ok(i),
            _ => {}
        }
    }
    if in_quote {
        Err(ElementError::UnclosedQuote)
    } else {
        Err(ElementError::UnclosedAttributes)
    }
}

fn parse_attributes(list: &str) -> Result<Vec<Attribute>, ElementError> {
    let mut attributes = Vec::new();
    let mut chars = list.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ',' && *c != '=') {
            name.push(c);
        }
        if name.is_empty() {
            return Err(ElementError::EmptyAttributeName);
        }

        let value = if chars.next_if_eq(&'=').is_some() {
            let mut value = String::new();
            if chars.next_if_eq(&'"').is_some() {
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => value.push(c),
                        None => return Err(ElementError::UnclosedQuote),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ',') {
                    value.push(c);
                }
            }
            Some(value)
        } else {
            None
        };

        attributes.push(Attribute { name, value });
    }

    Ok(attributes)
}
