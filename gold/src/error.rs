use thiserror::Error;

use crate::parser::ParseError;
use crate::template::html::RenderError;

/// Any failure of [`Generator::parse_file`](crate::Generator::parse_file).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("compile error: {0}")]
    Compile(#[source] Box<dyn std::error::Error + Send + Sync>),
}
