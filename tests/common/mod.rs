use cfmt::error::Diagnostics;
use cfmt::options::Options;
use cfmt::parser;
use cfmt::style::Style;

/// Format a source with the default style.
#[allow(dead_code)]
pub fn fmt(src: &str) -> String {
    fmt_with(src, "t.c", "", false)
}

/// Format a source with the simplification passes enabled.
#[allow(dead_code)]
pub fn fmt_simple(src: &str) -> String {
    fmt_with(src, "t.c", "", true)
}

/// Format a source with the given clang-format configuration.
#[allow(dead_code)]
pub fn fmt_config(src: &str, config: &str) -> String {
    fmt_with(src, "t.c", config, false)
}

#[allow(dead_code)]
pub fn fmt_with(src: &str, path: &str, config: &str, simple: bool) -> String {
    let mut diags = Diagnostics::new();
    let config = if config.is_empty() {
        None
    } else {
        Some(config)
    };
    let style = Style::from_config(config, ".clang-format", &mut diags);
    assert!(
        diags.is_empty(),
        "configuration diagnostics: {:?}",
        diags.entries()
    );

    let options = Options {
        simple,
        ..Options::default()
    };
    let (out, diags) =
        parser::format(src, path, &style, &options, vec![]).expect("formatting failed");
    assert!(diags.is_empty(), "diagnostics: {:?}", diags.entries());
    out
}
