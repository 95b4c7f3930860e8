mod manifest;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gold::{Element, Error, Generator, ParseError, Template};

#[derive(Parser)]
#[command(name = "gold", version, about = "Gold template compiler")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template with optional TOML data
    Render(RenderArgs),

    /// Parse a template and its super templates without rendering
    Check(FileArgs),

    /// Print the parsed tree of a template
    Tree(FileArgs),

    /// Render every page listed in a build manifest
    Build(BuildArgs),

    /// Run .test.toml template test cases
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template file to render
    file: PathBuf,

    /// TOML file whose top-level table becomes the render context
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print the intermediate markup instead of the rendered output
    #[arg(long)]
    markup: bool,

    /// Parse and compile without caching templates
    #[arg(long)]
    no_cache: bool,
}

#[derive(clap::Args)]
struct FileArgs {
    /// Template file
    file: PathBuf,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Path to the build manifest
    #[arg(default_value = "gold.toml")]
    manifest: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GOLD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Render(args) => do_render(args, color_choice),
        Command::Check(args) => do_check(&args.file, color_choice),
        Command::Tree(args) => do_tree(&args.file, color_choice),
        Command::Build(args) => manifest::build(&args.manifest, color_choice),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn do_render(args: RenderArgs, color_choice: ColorChoice) -> i32 {
    let context = match &args.data {
        Some(path) => match load_context(path) {
            Ok(context) => context,
            Err(message) => {
                eprintln!("error: {}", message);
                return 1;
            }
        },
        None => tera::Context::new(),
    };

    let mut generator = render_generator(&args);
    debug!(cache = generator.is_caching(), file = %args.file.display(), "rendering");

    if args.markup {
        let markup = generator
            .parse(&args.file)
            .map_err(Error::from)
            .and_then(|template| template.html().map_err(Error::from));
        return match markup {
            Ok(markup) => {
                println!("{}", markup);
                0
            }
            Err(error) => {
                emit_error(&error, color_choice);
                1
            }
        };
    }

    let compiled = match generator.parse_file(&args.file) {
        Ok(compiled) => compiled,
        Err(error) => {
            emit_error(&error, color_choice);
            return 1;
        }
    };
    match compiled.render(&context) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(error) => {
            eprintln!("render error: {}", format_error_chain(&error));
            1
        }
    }
}

fn render_generator(args: &RenderArgs) -> Generator {
    Generator::new(!args.no_cache)
}

fn do_check(path: &Path, color_choice: ColorChoice) -> i32 {
    match Generator::new(false).parse(path) {
        Ok(_) => {
            eprintln!("ok: {} parsed successfully", path.display());
            0
        }
        Err(error) => {
            emit_parse_error(&error, color_choice);
            1
        }
    }
}

fn do_tree(path: &Path, color_choice: ColorChoice) -> i32 {
    let template = match Generator::new(false).parse(path) {
        Ok(t) => t,
        Err(error) => {
            emit_parse_error(&error, color_choice);
            return 1;
        }
    };

    let mut current: Option<&Template> = Some(template.as_ref());
    while let Some(t) = current {
        println!("template {}", t.path().display());
        let mut names: Vec<&String> = t.blocks().keys().collect();
        names.sort();
        for name in names {
            println!("  block {}", name);
            if let Some(block) = t.block(name) {
                print_elements(&block.children, 2);
            }
        }
        if t.super_template().is_none() {
            print_elements(t.elements(), 1);
        }
        current = t.super_template().map(|s| s.as_ref());
    }
    0
}

fn print_elements(elements: &[Element], depth: usize) {
    for element in elements {
        let pad = "  ".repeat(depth);
        let raw = if element.raw_content { " (raw)" } else { "" };
        println!(
            "{}{:?} {}{} [line {}]",
            pad,
            element.kind,
            element.text.trim(),
            raw,
            element.line_no
        );
        print_elements(&element.children, depth + 1);
    }
}

/// Read a TOML file into a Tera context.
fn load_context(path: &Path) -> Result<tera::Context, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    let table: toml::Table =
        toml::from_str(&text).map_err(|e| format!("TOML parse error in '{}': {}", path.display(), e))?;
    tera::Context::from_serialize(table).map_err(|e| format_error_chain(&e))
}

pub(crate) fn emit_error(error: &Error, color_choice: ColorChoice) {
    match error {
        Error::Parse(error) => emit_parse_error(error, color_choice),
        Error::Render(error) => eprintln!("render error: {}", error),
        Error::Compile(error) => eprintln!("compile error: {}", format_error_chain(error.as_ref())),
    }
}

/// Show a parse error as a diagnostic on the file and line it occurred in.
pub(crate) fn emit_parse_error(error: &ParseError, color_choice: ColorChoice) {
    let source = match error.line() {
        Some(_) => std::fs::read_to_string(error.path())
            .map(|s| gold::line::normalize_newlines(&s))
            .ok(),
        None => None,
    };
    let Some(source) = source else {
        eprintln!("error: {}", error);
        return;
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(error.path().display().to_string(), source.clone());
    let diagnostic = error.to_diagnostic(file_id, &source);
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
}

pub(crate) fn format_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_args(argv: &[&str]) -> RenderArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Render(args) => args,
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn render_caches_by_default() {
        let args = render_args(&["gold", "render", "page.gold"]);
        assert!(!args.no_cache);
        assert!(!args.markup);
        assert_eq!(args.file, PathBuf::from("page.gold"));
        assert!(render_generator(&args).is_caching());
    }

    #[test]
    fn render_no_cache_flag() {
        let args = render_args(&["gold", "render", "page.gold", "--no-cache", "--markup"]);
        assert!(args.no_cache);
        assert!(args.markup);
        assert!(!render_generator(&args).is_caching());
    }
}
