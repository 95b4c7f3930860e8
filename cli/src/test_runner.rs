use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use gold::{Error, Generator};

use crate::format_error_chain;

const TEST_SUFFIX: &str = ".test.toml";

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Template to render, relative to the test file. Defaults to the test
    /// file name with `.test.toml` replaced by `.gold`.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Render context.
    #[serde(default)]
    pub data: toml::Table,

    /// Expected exact output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected error: the error message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,
}

fn default_template(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(TEST_SUFFIX).unwrap_or(name);
    path.with_file_name(format!("{}{}", stem, gold::parser::EXTENSION))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    // 1. Read and parse the test config
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let config: TestConfig = match toml::from_str(&content) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("TOML parse error: {}", e)),
    };
    let description = config.description.clone();

    let template = match &config.template {
        Some(t) => path.parent().unwrap_or(Path::new(".")).join(t),
        None => default_template(path),
    };

    // 2. Compile
    let mut generator = Generator::new(false);
    let compiled = generator.parse_file(&template);

    // 3. Handle expect_parse_error
    if config.expect_parse_error {
        let outcome = match compiled {
            Err(Error::Parse(_)) => TestOutcome::Pass,
            Err(other) => TestOutcome::Fail(format!("expected parse error, got: {}", other)),
            Ok(_) => TestOutcome::Fail("expected parse error, but parsing succeeded".into()),
        };
        return TestResult {
            path: path.to_path_buf(),
            description,
            outcome,
        };
    }

    // 4. Render
    let rendered = compiled.map_err(|e| format_error_chain(&e)).and_then(|compiled| {
        tera::Context::from_serialize(&config.data)
            .and_then(|context| compiled.render(&context))
            .map_err(|e| format_error_chain(&e))
    });

    // 5. Check error/output expectations
    let outcome = match (&config.expect_error, &config.expect_output, rendered) {
        (Some(expected_err), _, Err(err)) => {
            if err.contains(expected_err.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected_err, err
                ))
            }
        }
        (Some(expected_err), _, Ok(_)) => Some(format!(
            "expected error containing \"{}\", but rendering succeeded",
            expected_err
        )),
        (None, _, Err(err)) => Some(format!("unexpected error: {}", err)),
        (None, Some(expected_output), Ok(actual)) => {
            let actual_trimmed = actual.trim();
            let expected_trimmed = expected_output.trim();
            if actual_trimmed == expected_trimmed {
                None
            } else {
                Some(format!(
                    "output mismatch\n  expected: {}\n  actual:   {}",
                    expected_trimmed, actual_trimmed
                ))
            }
        }
        (None, None, Ok(_)) => None,
    };

    match outcome {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Test files grouped by the directory they sit in, relative to the search
/// root. Files directly under the root have the empty category.
type Categories = BTreeMap<String, Vec<PathBuf>>;

fn discover(root: &Path) -> Categories {
    if root.is_file() {
        return BTreeMap::from([(String::new(), vec![root.to_path_buf()])]);
    }

    let mut categories = Categories::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(TEST_SUFFIX));
            if is_test {
                let category = dir
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                categories.entry(category).or_default().push(path);
            }
        }
    }
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} templates)", category_label(category), files.len());
    }
}

/// ANSI styling for the report, disabled by `--no-color`.
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

fn label_of(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(TEST_SUFFIX))
            .unwrap_or("?")
    })
}

/// Run all `.test.toml` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };
    let discovered = discover(path);
    if discovered.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }
    let selected = if categories.is_empty() || path.is_file() {
        discovered
    } else {
        filter_categories(discovered, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let results: Vec<(String, TestResult)> = selected
        .into_iter()
        .flat_map(|(category, files)| {
            files
                .into_iter()
                .map(move |file| (category.clone(), run_single_test(&file)))
        })
        .collect();

    let mut current: Option<&str> = None;
    for (category, result) in &results {
        if current != Some(category.as_str()) {
            eprintln!();
            eprintln!("{}", style.paint("1", category_label(category)));
            current = Some(category.as_str());
        }
        let status = match result.outcome {
            TestOutcome::Pass => style.paint("32", "PASS"),
            TestOutcome::Fail(_) => style.paint("31", "FAIL"),
        };
        eprintln!("  {}  {}", status, label_of(result));
    }

    let failures: Vec<(&Path, &str)> = results
        .iter()
        .filter_map(|(_, r)| match &r.outcome {
            TestOutcome::Fail(reason) => Some((r.path.as_path(), reason.as_str())),
            TestOutcome::Pass => None,
        })
        .collect();
    let passed = results.len() - failures.len();

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for (path, reason) in &failures {
            eprintln!();
            eprintln!("  --- {} ---", path.display());
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failures.len(),
            results.len()
        );
        1
    }
}

fn filter_categories(all_categories: Categories, requested: &[String]) -> Categories {
    let available: Vec<&str> = all_categories.keys().map(|k| category_label(k)).collect();
    let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();

    for req in &wanted {
        let found = all_categories
            .keys()
            .any(|cat| cat.as_str() == *req || cat.starts_with(&format!("{}/", req)));
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }

    all_categories
        .into_iter()
        .filter(|(cat, _)| {
            wanted
                .iter()
                .any(|req| cat.as_str() == *req || cat.starts_with(&format!("{}/", req)))
        })
        .collect()
}
