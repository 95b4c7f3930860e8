use crate::element::{Element, ElementKind, Parent};

/// A node that owns an ordered list of child elements.
pub trait Container {
    fn append_child(&mut self, child: Element);

    /// Kind and raw flag handed to new children, `None` for nodes that do not
    /// affect how their children are classified.
    fn child_context(&self) -> Option<(ElementKind, bool)>;

    /// How children of this node record their parent.
    fn as_parent(&self) -> Parent;
}
