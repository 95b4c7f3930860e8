pub mod html;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::block::Block;
use crate::element::Element;

/// One parsed source file.
///
/// A template that extends another holds a strong reference to its super
/// template; the super template points back with a weak reference, so a chain
/// lives exactly as long as whoever holds its most derived template.
pub struct Template {
    path: PathBuf,
    super_template: Option<Rc<Template>>,
    sub_template: RefCell<Weak<Template>>,
    blocks: HashMap<String, Block>,
    elements: Vec<Element>,
}

impl Template {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that `extends` targets are resolved against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn super_template(&self) -> Option<&Rc<Template>> {
        self.super_template.as_ref()
    }

    /// The template that most recently extended this one, if it is still alive.
    pub fn sub_template(&self) -> Option<Rc<Template>> {
        self.sub_template.borrow().upgrade()
    }

    /// Top of the inheritance chain.
    pub fn root(&self) -> &Template {
        let mut current = self;
        while let Some(parent) = &current.super_template {
            current = parent;
        }
        current
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn blocks(&self) -> &HashMap<String, Block> {
        &self.blocks
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Most derived override of `name`, searching from this template upwards.
    pub fn resolve_block(&self, name: &str) -> Option<&Block> {
        let mut current = Some(self);
        while let Some(template) = current {
            if let Some(block) = template.blocks.get(name) {
                return Some(block);
            }
            current = template.super_template.as_deref();
        }
        None
    }
}

impl PartialEq for Template {
    /// Structural equality. The sub back link is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.super_template == other.super_template
            && self.blocks == other.blocks
            && self.elements == other.elements
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("path", &self.path)
            .field("super_template", &self.super_template)
            .field("sub_template", &self.sub_template().map(|t| t.path.clone()))
            .field("blocks", &self.blocks)
            .field("elements", &self.elements)
            .finish()
    }
}

/// Mutable form of a [`Template`] while its source is being parsed.
#[derive(Debug)]
pub(crate) struct TemplateBuilder {
    path: PathBuf,
    super_template: Option<Rc<Template>>,
    blocks: HashMap<String, Block>,
    elements: Vec<Element>,
}

impl TemplateBuilder {
    pub(crate) fn new(path: &Path) -> Self {
        TemplateBuilder {
            path: path.to_path_buf(),
            super_template: None,
            blocks: HashMap::new(),
            elements: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub(crate) fn has_super(&self) -> bool {
        self.super_template.is_some()
    }

    pub(crate) fn set_super(&mut self, template: Rc<Template>) {
        self.super_template = Some(template);
    }

    /// Replaces any block already registered under the same name.
    pub(crate) fn add_block(&mut self, block: Block) {
        self.blocks.insert(block.name.clone(), block);
    }

    pub(crate) fn append_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Freeze the template and point its super template back at it.
    pub(crate) fn finish(self) -> Rc<Template> {
        Rc::new_cyclic(move |me| {
            if let Some(parent) = &self.super_template {
                parent.sub_template.replace(me.clone());
            }
            Template {
                path: self.path,
                super_template: self.super_template,
                sub_template: RefCell::new(Weak::new()),
                blocks: self.blocks,
                elements: self.elements,
            }
        })
    }
}
