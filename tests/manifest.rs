//! Manifest loading and the render pipeline

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tessera::component::ComponentError;
use tessera::manifest::parse_value;
use tessera::{
    render_manifest, render_manifest_file, Error, HtmlRenderer, Manifest, ManifestError,
    MarkupError, Value,
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

const TODOS: &str = r##"
el = "#todos"
root = "App"
template = """<ul><item v-for="t in Todos" v-if="!t.Done" v-bind:label="t.Title"></item></ul>"""

[[shapes]]
name = "Todo"
fields = [{ name = "Title", type = "string" }, { name = "Done", type = "bool" }]

[[shapes]]
name = "App"
fields = [{ name = "Todos", type = "list<Todo>" }]

[data]
Todos = [{ Title = "a" }, { Title = "b", Done = true }, { Title = "<c>" }]

[components.item]
template = "<li>{{ Label }}</li>"
props = ["Label"]
"##;

#[test]
fn test_typed_manifest_with_sub_components() {
    let html = render_manifest(TODOS).unwrap();
    insta::assert_snapshot!(html, @"<ul><li>a</li><li>&lt;c&gt;</li></ul>");
}

#[test]
fn test_manifest_mount_reacts_to_sets() {
    let manifest = Manifest::from_str(TODOS).unwrap();
    let renderer = HtmlRenderer::new();
    let frames = renderer.clone();
    let instance = manifest.mount(renderer).unwrap();

    instance.set("Todos[1].Done", false).unwrap();
    assert_eq!(
        frames.last().as_deref(),
        Some("<ul><li>a</li><li>b</li><li>&lt;c&gt;</li></ul>")
    );
    assert_eq!(frames.count(), 2);
}

#[test]
fn test_hello_demo() {
    let html = render_manifest_file(&demo("hello.toml"), &[]).unwrap();
    assert!(html.contains("<h1>Hello, Tessera!</h1>"), "{html}");
    assert!(html.contains("<p>Nice to see you.</p>"), "{html}");

    let sets = vec![
        ("Name".to_string(), parse_value("\"World\"")),
        ("Excited".to_string(), parse_value("false")),
    ];
    let html = render_manifest_file(&demo("hello.toml"), &sets).unwrap();
    assert!(html.contains("<h1>Hello, World!</h1>"), "{html}");
    assert!(!html.contains("Nice to see you"), "{html}");
}

#[test]
fn test_todo_demo_reads_template_file() {
    let html = render_manifest_file(&demo("todo.toml"), &[]).unwrap();
    assert!(html.contains("<h2>Things to do</h2>"), "{html}");
    assert!(html.contains(r#"<input value="">"#), "{html}");
    assert!(!html.contains("Write the mapper"), "{html}");
    assert!(html.contains(r#"<li class="active">"#), "{html}");
    assert!(
        html.contains(r#"<span class="badge">Wire the directives</span>"#),
        "{html}"
    );
    assert!(html.contains(r#"<span class="badge">Ship it</span>"#), "{html}");

    let sets = vec![("Todos[0].Done".to_string(), Value::Bool(false))];
    let html = render_manifest_file(&demo("todo.toml"), &sets).unwrap();
    assert!(html.contains(r#"<li class="is-done">"#), "{html}");
    assert!(html.contains("Write the mapper"), "{html}");
}

#[test]
fn test_missing_manifest_file() {
    let err = render_manifest_file(&demo("nope.toml"), &[]).unwrap_err();
    assert!(matches!(err, Error::Manifest(ManifestError::IoError(_))));
}

#[test]
fn test_invalid_toml() {
    let err = render_manifest("template = ").unwrap_err();
    assert!(matches!(err, Error::Manifest(ManifestError::ParseError(_))));
}

#[test]
fn test_unknown_field_type() {
    let source = r#"
template = "<p></p>"
[[shapes]]
name = "App"
fields = [{ name = "X", type = "list<" }]
"#;
    let err = render_manifest(source).unwrap_err();
    assert!(matches!(
        err,
        Error::Manifest(ManifestError::Schema(tessera::SchemaError::InvalidKind { .. }))
    ));
}

#[test]
fn test_markup_errors_carry_the_template() {
    let err = render_manifest("template = \"<p><b></p>\"").unwrap_err();
    let (error, template) = match err {
        Error::Manifest(ManifestError::Component(ComponentError::Markup { error, template })) => {
            (error, template)
        }
        other => panic!("expected a markup error, got {other:?}"),
    };
    assert_eq!(template, "<p><b></p>");
    assert!(matches!(error, MarkupError::MismatchedClose { .. }));
    let report = error.format(&template, "inline.toml");
    assert!(report.contains("expected </b>"), "{report}");
}

#[test]
fn test_render_failure_surfaces_from_mount() {
    let source = r#"
template = "<p v-if='Name'>x</p>"
[data]
Name = "not a bool"
"#;
    let err = render_manifest(source).unwrap_err();
    assert!(matches!(err, Error::Context(tessera::ContextError::Render(_))));
}
