//! Hand-off from rendered markup to the template engine that substitutes
//! variables into it.

use tera::{Context, Tera};
use tracing::debug;

/// Turns rendered markup into an executable template.
pub trait Compiler {
    type Artifact;
    type Error: std::error::Error + Send + Sync + 'static;

    fn compile(&self, name: &str, markup: &str) -> Result<Self::Artifact, Self::Error>;
}

/// Compiles markup with Tera. Expressions written as `{{ ... }}` or
/// `{% ... %}` lines pass through the markup renderer untouched and are
/// evaluated here.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraCompiler;

/// A Tera template holding exactly one compiled source.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    tera: Tera,
}

impl CompiledTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(&self.name, context)
    }
}

impl Compiler for TeraCompiler {
    type Artifact = CompiledTemplate;
    type Error = tera::Error;

    fn compile(&self, name: &str, markup: &str) -> Result<CompiledTemplate, tera::Error> {
        debug!(name, bytes = markup.len(), "compiling markup");
        let mut tera = Tera::default();
        tera.autoescape_on(vec![crate::parser::EXTENSION]);
        tera.add_raw_template(name, markup)?;
        Ok(CompiledTemplate {
            name: name.to_string(),
            tera,
        })
    }
}
