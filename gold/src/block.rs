use std::path::{Path, PathBuf};

use crate::container::Container;
use crate::element::{Element, ElementKind, Parent};

/// A named override declared by a template that extends another one.
///
/// At render time it replaces every `block <name>` placeholder element of the
/// same name further up the inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Path of the template that declared the block.
    pub template: PathBuf,
    pub children: Vec<Element>,
}

impl Block {
    pub fn new(name: impl Into<String>, template: &Path) -> Self {
        Block {
            name: name.into(),
            template: template.to_path_buf(),
            children: Vec::new(),
        }
    }
}

impl Container for Block {
    fn append_child(&mut self, child: Element) {
        self.children.push(child);
    }

    fn child_context(&self) -> Option<(ElementKind, bool)> {
        None
    }

    fn as_parent(&self) -> Parent {
        Parent::Block
    }
}
