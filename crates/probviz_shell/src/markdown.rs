use pulldown_cmark::{html, Event, Options, Parser};

const KATEX_VERSION: &str = "0.16.11";

/// Renders Markdown into an HTML fragment.
///
/// `$...$` and `$$...$$` spans are emitted verbatim inside `\(...\)` and
/// `\[...\]` delimiters so KaTeX auto-render can typeset them in the page.
pub fn render_markdown(md: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);

    let events = Parser::new_ext(md, options).map(|event| match event {
        Event::InlineMath(tex) => Event::Html(
            format!(r#"<span class="math">\({}\)</span>"#, escape_html(&tex)).into(),
        ),
        Event::DisplayMath(tex) => Event::Html(
            format!(r#"<div class="math">\[{}\]</div>"#, escape_html(&tex)).into(),
        ),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Wraps a rendered fragment into a standalone, themed document.
pub fn html_document(title: &str, body: &str, dark: bool) -> String {
    let (bg, fg, border) = if dark {
        ("#1e1e1e", "#e8ecff", "#3a3a3a")
    } else {
        ("#ffffff", "#1b1b1f", "#d0d0d7")
    };
    format!(
        r#"<!DOCTYPE html>
<html data-theme="{theme}">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@{v}/dist/katex.min.css">
<script defer src="https://cdn.jsdelivr.net/npm/katex@{v}/dist/katex.min.js"></script>
<script defer src="https://cdn.jsdelivr.net/npm/katex@{v}/dist/contrib/auto-render.min.js"
  onload="renderMathInElement(document.body);"></script>
<style>
body {{ background: {bg}; color: {fg}; font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; line-height: 1.6; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid {border}; padding: 0.3rem 0.8rem; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        theme = if dark { "dark" } else { "light" },
        title = escape_html(title),
        v = KATEX_VERSION,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
