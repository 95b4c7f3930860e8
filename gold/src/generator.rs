use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::compiler::{Compiler, TeraCompiler};
use crate::error::Error;
use crate::line::normalize_newlines;
use crate::parser::{ParseError, Resolver, parse_template};
use crate::template::Template;

/// Entry point: parses template files and compiles them, optionally caching
/// both results by path.
///
/// A generator is single-threaded. Templates are shared through `Rc`, so it
/// is neither `Send` nor `Sync`.
pub struct Generator<C: Compiler = TeraCompiler> {
    cache: bool,
    compiler: C,
    templates: HashMap<PathBuf, Rc<Template>>,
    artifacts: HashMap<PathBuf, Rc<C::Artifact>>,
    /// Files currently being parsed, outermost first, as `(path, identity)`.
    /// The identity is the canonical path, so aliased spellings of one file
    /// compare equal.
    resolving: Vec<(PathBuf, PathBuf)>,
}

impl Generator {
    pub fn new(cache: bool) -> Self {
        Generator::with_compiler(cache, TeraCompiler)
    }
}

impl<C: Compiler> Generator<C> {
    pub fn with_compiler(cache: bool, compiler: C) -> Self {
        Generator {
            cache,
            compiler,
            templates: HashMap::new(),
            artifacts: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    pub fn is_caching(&self) -> bool {
        self.cache
    }

    pub fn clear_cache(&mut self) {
        self.templates.clear();
        self.artifacts.clear();
    }

    /// Parse the file at `path` into a template, resolving its `extends` chain.
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Result<Rc<Template>, ParseError> {
        let path = path.as_ref();
        if self.cache {
            if let Some(template) = self.templates.get(path) {
                debug!(path = %path.display(), "template cache hit");
                return Ok(Rc::clone(template));
            }
        }

        let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = normalize_newlines(&source);

        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.resolving.iter().any(|(_, id)| *id == identity) {
            let mut chain: Vec<PathBuf> = self.resolving.iter().map(|(p, _)| p.clone()).collect();
            chain.push(path.to_path_buf());
            return Err(ParseError::CyclicExtends {
                path: path.to_path_buf(),
                chain,
            });
        }

        debug!(path = %path.display(), "parsing template");
        self.resolving.push((path.to_path_buf(), identity));
        let result = parse_template(path, &source, self);
        self.resolving.pop();
        let template = result?;

        if self.cache {
            self.templates.insert(path.to_path_buf(), Rc::clone(&template));
        }
        Ok(template)
    }

    /// Parse, render and compile the file at `path`.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Rc<C::Artifact>, Error> {
        let path = path.as_ref();
        if self.cache {
            if let Some(artifact) = self.artifacts.get(path) {
                debug!(path = %path.display(), "artifact cache hit");
                return Ok(Rc::clone(artifact));
            }
        }

        let template = self.parse(path)?;
        let markup = template.html()?;
        let name = path.to_string_lossy();
        let artifact = self
            .compiler
            .compile(&name, &markup)
            .map(Rc::new)
            .map_err(|e| Error::Compile(Box::new(e)))?;

        if self.cache {
            self.artifacts.insert(path.to_path_buf(), Rc::clone(&artifact));
        }
        Ok(artifact)
    }
}

impl<C: Compiler> Resolver for Generator<C> {
    fn resolve(&mut self, path: &Path) -> Result<Rc<Template>, ParseError> {
        self.parse(path)
    }
}
