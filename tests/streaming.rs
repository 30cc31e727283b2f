use brace::{Error, JsonValue, MapsAndLists, RenderError, RenderOptions, Template};

use std::collections::HashMap;
use std::io::{self, Write};

fn json(data: &str) -> JsonValue {
    serde_json::from_str(data).unwrap()
}

#[test]
fn large_static_template_renders_under_a_small_budget() {
    let mut source = "lorem ipsum dolor sit amet\n".repeat(400_000);
    source.push_str("{{name}}");
    let data = json(r#"{ "name": "end" }"#);
    let template = Template::from(&source).unwrap();
    let options = RenderOptions {
        budget: Some(32 * 1024),
        ..RenderOptions::default()
    };
    let mut sink = io::sink();
    template.render_with(&data, &mut sink, &options).unwrap();
}

#[test]
fn runaway_lambda_exhausts_the_budget() {
    let mut members = HashMap::new();
    members.insert(
        String::from("flood"),
        MapsAndLists::lambda0(|| "x".repeat(1 << 20)),
    );
    let data = MapsAndLists::mapping(members);
    let template = Template::from("{{flood}}").unwrap();
    let options = RenderOptions {
        budget: Some(1024),
        ..RenderOptions::default()
    };
    let mut sink = Vec::new();
    let err = template.render_with(&data, &mut sink, &options).unwrap_err();
    assert!(matches!(err, RenderError::OutOfBudget { .. }));
}

struct FailingSink {
    remaining: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink full"));
        }
        let taken = buf.len().min(self.remaining);
        self.remaining -= taken;
        Ok(taken)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_errors_abort_the_render() {
    let data = json(r#"{ "x": "y" }"#);
    let template = Template::from("0123456789{{x}}").unwrap();
    let mut sink = FailingSink { remaining: 4 };
    let err = template
        .render_with(&data, &mut sink, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, RenderError::SinkWriteFailed { .. }));
}

#[test]
fn inheritance_tags_parse_but_do_not_render() {
    let data = json("{}");
    let template = Template::from("{{<layout}}{{$title}}t{{/title}}{{/layout}}").unwrap();
    let err = template.render(&data).unwrap_err();
    assert!(matches!(err, RenderError::FeatureUnsupported { .. }));
}

#[test]
fn concurrent_renders_match_sequential_output() {
    let source = String::from("{{#items}}({{.}}){{/items}}");
    let data = json(r#"{ "items": [1, 2, 3, 4] }"#);
    let template = Template::from(&source).unwrap();
    let expected = template.render(&data).unwrap();
    assert_eq!(expected, "(1)(2)(3)(4)");
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(template.render(&data).unwrap(), expected);
            });
        }
    });
}

#[test]
fn render_str_parses_and_renders() {
    let data = json(r#"{ "n": 1 }"#);
    let mut sink = Vec::new();
    brace::render_str(
        "{{=<% %>=}}<%n%>",
        &data,
        &mut sink,
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(sink, b"1".to_vec());
}

#[test]
fn render_str_honors_the_delimiters_option() {
    let data = json(r#"{ "n": 2 }"#);
    let options = RenderOptions {
        delimiters: Some(("<%", "%>")),
        ..RenderOptions::default()
    };
    let mut sink = Vec::new();
    brace::render_str("{{n}}<%n%>", &data, &mut sink, &options).unwrap();
    assert_eq!(String::from_utf8(sink).unwrap(), "{{n}}2");
}

#[test]
fn render_str_surfaces_parse_errors() {
    let data = json("{}");
    let mut sink = Vec::new();
    let err = brace::render_str("{{#open}}", &data, &mut sink, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn render_file_reads_and_renders() {
    let path = std::env::temp_dir().join("brace-render-file.mustache");
    std::fs::write(&path, "Hello {{name}}!").unwrap();
    let data = json(r#"{ "name": "World" }"#);
    let mut sink = Vec::new();
    brace::render_file(&path, &data, &mut sink, &RenderOptions::default()).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(String::from_utf8(sink).unwrap(), "Hello World!");
}

#[test]
fn missing_template_file_is_an_io_error() {
    let data = json("{}");
    let mut sink = Vec::new();
    let err = brace::render_file(
        "/no/such/brace-template.mustache",
        &data,
        &mut sink,
        &RenderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
