pub mod block;
pub mod compiler;
pub mod container;
pub mod element;
pub mod error;
pub mod generator;
pub mod line;
pub mod parser;
pub mod template;

pub use block::Block;
pub use compiler::{CompiledTemplate, Compiler, TeraCompiler};
pub use element::{Element, ElementKind, Parent};
pub use error::Error;
pub use generator::Generator;
pub use parser::ParseError;
pub use template::Template;
pub use template::html::RenderError;
