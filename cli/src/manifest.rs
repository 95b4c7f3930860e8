use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::ColorChoice;
use serde::Deserialize;
use tracing::info;

use gold::Generator;

use crate::{emit_error, format_error_chain};

/// A `gold.toml` build manifest.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Share parsed and compiled templates between pages.
    #[serde(default = "default_cache")]
    pub cache: bool,

    /// Pages to render, in order.
    #[serde(default, rename = "page")]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    /// Template path, relative to the manifest.
    pub template: PathBuf,

    /// Output path, relative to the manifest.
    pub output: PathBuf,

    /// Render context for this page.
    #[serde(default)]
    pub data: toml::Table,
}

fn default_cache() -> bool {
    true
}

fn load(path: &Path) -> Result<Manifest, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("TOML parse error in '{}': {}", path.display(), e))
}

/// Render every page of the manifest at `path`. Returns the exit code.
pub fn build(path: &Path, color_choice: ColorChoice) -> i32 {
    let manifest = match load(path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let base_dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut generator = Generator::new(manifest.cache);
    let mut failed = 0usize;

    for page in &manifest.pages {
        let template = base_dir.join(&page.template);
        let output = base_dir.join(&page.output);

        let compiled = match generator.parse_file(&template) {
            Ok(c) => c,
            Err(error) => {
                emit_error(&error, color_choice);
                failed += 1;
                continue;
            }
        };

        let rendered = tera::Context::from_serialize(&page.data)
            .and_then(|context| compiled.render(&context));
        let rendered = match rendered {
            Ok(r) => r,
            Err(error) => {
                eprintln!(
                    "render error in '{}': {}",
                    template.display(),
                    format_error_chain(&error)
                );
                failed += 1;
                continue;
            }
        };

        if let Some(dir) = output.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("error: cannot create '{}': {}", dir.display(), e);
                failed += 1;
                continue;
            }
        }
        if let Err(e) = std::fs::write(&output, rendered) {
            eprintln!("error: cannot write '{}': {}", output.display(), e);
            failed += 1;
            continue;
        }
        info!(template = %template.display(), output = %output.display(), "page rendered");
        eprintln!("wrote {}", output.display());
    }

    if failed == 0 {
        eprintln!("ok: {} page(s) built", manifest.pages.len());
        0
    } else {
        eprintln!("error: {} of {} page(s) failed", failed, manifest.pages.len());
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_defaults() {
        let manifest: Manifest = toml::from_str(
            r#"
[[page]]
template = "index.gold"
output = "out/index.html"

[page.data]
title = "Home"
"#,
        )
        .unwrap();
        assert!(manifest.cache);
        assert_eq!(manifest.pages.len(), 1);
        assert_eq!(manifest.pages[0].data["title"].as_str(), Some("Home"));
    }

    #[test]
    fn cache_can_be_disabled() {
        let manifest: Manifest = toml::from_str("cache = false").unwrap();
        assert!(!manifest.cache);
        assert!(manifest.pages.is_empty());
    }
}
