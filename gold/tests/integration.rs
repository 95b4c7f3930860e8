use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gold::{ElementKind, Error, Generator, ParseError};
use pretty_assertions::assert_eq;

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).expect("failed to write template");
    path
}

fn render(generator: &mut Generator, path: &Path, context: &tera::Context) -> String {
    generator
        .parse_file(path)
        .expect("compile failed")
        .render(context)
        .expect("render failed")
}

#[test]
fn child_extends_base_and_registers_block() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), "base.gold", "html\n\tbody\n\t\tp base\n");
    let child = write(dir.path(), "child.gold", "extends base\nblock title\n\th1 Hello\n");

    let mut generator = Generator::new(false);
    let template = generator.parse(&child).expect("parse failed");

    let base = template.super_template().expect("super template");
    assert_eq!(base.path(), dir.path().join("base.gold"));
    assert!(Rc::ptr_eq(&base.sub_template().expect("sub template"), &template));
    assert_eq!(template.blocks().len(), 1);
    assert_eq!(template.block("title").expect("title block").children.len(), 1);
    assert!(base.blocks().is_empty());
}

#[test]
fn lone_block_line_is_an_ordinary_element() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "block greeting\n");

    let template = Generator::new(true).parse(&path).expect("parse failed");
    assert!(template.blocks().is_empty());
    assert_eq!(template.elements().len(), 1);
    assert_eq!(template.elements()[0].text, "block greeting");
    assert_eq!(template.elements()[0].kind, ElementKind::Block);
}

#[test]
fn inheritance_renders_most_derived_blocks() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "layout.gold",
        "doctype html\nhtml\n\thead\n\t\ttitle\n\t\t\tblock title\n\tbody\n\t\tblock content\n\t\tfooter\n\t\t\tblock footer\n",
    );
    write(
        dir.path(),
        "section.gold",
        "extends layout\nblock title\n\t| Section\nblock footer\n\tp section footer\n",
    );
    let page = write(
        dir.path(),
        "page.gold",
        "extends section\nblock content\n\th1 Page\n\tblock note\nblock title\n\t| Page title\n",
    );

    let mut generator = Generator::new(false);
    let markup = generator.parse(&page).expect("parse failed").html().expect("html failed");
    assert_eq!(
        markup,
        "<!DOCTYPE html><html><head><title>Page title</title></head><body><h1>Page</h1><footer><p>section footer</p></footer></body></html>"
    );
}

#[test]
fn render_through_tera_escapes_values() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(
        dir.path(),
        "greet.gold",
        "div.greeting\n\tp\n\t\t{{ name }}\n\t{% if admin %}\n\tp admin\n\t{% endif %}\n",
    );

    let mut context = tera::Context::new();
    context.insert("name", "<Ann>");
    context.insert("admin", &true);
    let mut generator = Generator::new(true);
    assert_eq!(
        render(&mut generator, &path, &context),
        r#"<div class="greeting"><p>&lt;Ann&gt;</p><p>admin</p></div>"#
    );
}

#[test]
fn cached_results_are_shared() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), "base.gold", "html\n\tblock body\n");
    let path = write(dir.path(), "page.gold", "extends base\nblock body\n\tp hi\n");

    let mut generator = Generator::new(true);
    let first = generator.parse(&path).expect("parse failed");
    let second = generator.parse(&path).expect("parse failed");
    assert!(Rc::ptr_eq(&first, &second));

    let base = generator.parse(dir.path().join("base.gold")).expect("parse failed");
    assert!(Rc::ptr_eq(&base, first.super_template().expect("super template")));

    let a = generator.parse_file(&path).expect("compile failed");
    let b = generator.parse_file(&path).expect("compile failed");
    assert!(Rc::ptr_eq(&a, &b));
}

#[test]
fn uncached_results_are_equal_but_distinct() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), "base.gold", "html\n\tblock body\n");
    let path = write(dir.path(), "page.gold", "extends base\nblock body\n\tp hi\n");

    let mut generator = Generator::new(false);
    let first = generator.parse(&path).expect("parse failed");
    let second = generator.parse(&path).expect("parse failed");
    assert!(!Rc::ptr_eq(&first, &second));
    assert_eq!(first, second);

    let a = generator.parse_file(&path).expect("compile failed");
    let b = generator.parse_file(&path).expect("compile failed");
    assert!(!Rc::ptr_eq(&a, &b));
}

#[test]
fn clear_cache_forces_reparse() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "p one\n");

    let mut generator = Generator::new(true);
    let first = generator.parse(&path).expect("parse failed");
    write(dir.path(), "page.gold", "p two\n");
    assert!(Rc::ptr_eq(&first, &generator.parse(&path).expect("parse failed")));

    generator.clear_cache();
    let fresh = generator.parse(&path).expect("parse failed");
    assert_eq!(fresh.elements()[0].text, "p two");
}

#[test]
fn extends_arity_error_with_and_without_cache() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "p\nextends a b\n");

    for cache in [true, false] {
        let mut generator = Generator::new(cache);
        for _ in 0..2 {
            let err = generator.parse(&path).unwrap_err();
            assert!(
                matches!(err, ParseError::TokenCount { expected: 2, actual: 3, line: 2, .. }),
                "{err:?}"
            );
        }
    }
}

#[test]
fn indentation_error_cites_line() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "html\n  body\n\n      p\n");

    let err = Generator::new(false).parse(&path).unwrap_err();
    assert!(matches!(err, ParseError::Indentation { line: 4, .. }), "{err:?}");
    assert_eq!(err.path(), path);
}

#[test]
fn crlf_sources_parse_like_lf() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let lf = write(dir.path(), "lf.gold", "ul\n\tli a\n\tli b\n");
    let crlf = write(dir.path(), "crlf.gold", "ul\r\n\tli a\r\n\tli b\r\n");

    let mut generator = Generator::new(false);
    let lf = generator.parse(&lf).expect("parse failed").html().expect("html failed");
    let crlf = generator.parse(&crlf).expect("parse failed").html().expect("html failed");
    assert_eq!(lf, crlf);
    assert_eq!(lf, "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn missing_super_template_is_an_io_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "extends nowhere\n");

    let err = Generator::new(true).parse(&path).unwrap_err();
    match err {
        ParseError::Io { path: missing, .. } => assert_eq!(missing, dir.path().join("nowhere.gold")),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn cyclic_extends_is_detected() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let a = write(dir.path(), "a.gold", "extends b\n");
    write(dir.path(), "b.gold", "extends a\n");

    let err = Generator::new(true).parse(&a).unwrap_err();
    match err {
        ParseError::CyclicExtends { path, chain } => {
            assert_eq!(path, a);
            assert_eq!(chain, vec![a.clone(), dir.path().join("b.gold"), a.clone()]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn cyclic_extends_through_an_aliased_path_is_detected() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::create_dir(dir.path().join("views")).expect("failed to create views dir");
    let a = write(&dir.path().join("views"), "a.gold", "extends ../views/a\n");

    let err = Generator::new(false).parse(&a).unwrap_err();
    match err {
        ParseError::CyclicExtends { path, chain } => {
            assert_eq!(path, dir.path().join("views/../views/a.gold"));
            assert_eq!(chain, vec![a.clone(), path.clone()]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn generator_reports_its_cache_mode() {
    assert!(Generator::new(true).is_caching());
    assert!(!Generator::new(false).is_caching());
}

#[test]
fn recursive_block_is_a_render_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), "base.gold", "div\n\tblock a\n");
    let path = write(dir.path(), "page.gold", "extends base\nblock a\n\tp\n\tblock a\n");

    let err = Generator::new(false).parse_file(&path).unwrap_err();
    assert!(matches!(err, Error::Render(_)), "{err:?}");
}

#[test]
fn compile_errors_propagate() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = write(dir.path(), "page.gold", "p\n\t{{ broken\n");

    let err = Generator::new(true).parse_file(&path).unwrap_err();
    assert!(matches!(err, Error::Compile(_)), "{err:?}");
}
