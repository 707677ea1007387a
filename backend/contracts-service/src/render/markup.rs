//! Typst source for a composed [`Document`].
//!
//! Every piece of document text reaches Typst as a string literal, so no
//! character in a snapshot can change the markup structure. Typst owns line
//! breaking, pagination, fonts and PDF output.

use super::blocks::{Block, Document, Logo, Paragraph, Run, LOGO_SIZE};
use super::style::{pt, PLACEHOLDER_BORDER, PLACEHOLDER_TEXT, SEPARATOR};

/// Vertical gap between grid and signature rows.
const ROW_GUTTER: f32 = 5.0;

/// Render `document` as a standalone Typst file.
pub fn to_markup(document: &Document) -> String {
    let mut lines = vec![
        format!(
            "#set document(title: {}, author: {})",
            string_literal(&document.title),
            string_literal(&document.author)
        ),
        "#set page(paper: \"a4\", margin: (x: 2cm, y: 1.8cm))".to_string(),
        "#set text(lang: \"es\")".to_string(),
        "#set block(spacing: 0pt)".to_string(),
    ];
    lines.extend(document.blocks.iter().map(|block| format!("#{}", block_expr(block))));
    lines.push(String::new());
    lines.join("\n")
}

fn block_expr(block: &Block) -> String {
    match block {
        Block::Header {
            title,
            subtitle,
            logo,
        } => format!(
            "grid(columns: (1fr, {size}), align: (left + horizon, right + horizon), \
             stack(spacing: 4pt, {title}, {subtitle}), {logo})",
            size = pt(LOGO_SIZE),
            title = paragraph_expr(title),
            subtitle = paragraph_expr(subtitle),
            logo = logo_expr(logo),
        ),
        Block::Separator => format!(
            "line(length: 100%, stroke: 0.5pt + {})",
            SEPARATOR.to_typst()
        ),
        Block::Spacer(height) => format!("v({})", pt(*height)),
        Block::Grid { label_width, rows } => {
            let cells = rows.iter().flat_map(|(label, value)| [label, value]);
            grid_expr(&format!("({}, 1fr)", pt(*label_width)), cells)
        }
        Block::Paragraph(paragraph) => paragraph_expr(paragraph),
        Block::Columns { column_width, rows } => {
            let count = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let columns = vec![pt(*column_width); count].join(", ");
            let mut cells = Vec::new();
            for row in rows {
                cells.extend(row.iter().map(paragraph_expr));
                cells.extend((row.len()..count).map(|_| "[]".to_string()));
            }
            format!(
                "grid(columns: ({columns},), row-gutter: {}, {})",
                pt(ROW_GUTTER),
                cells.join(", ")
            )
        }
    }
}

fn grid_expr<'a>(columns: &str, cells: impl Iterator<Item = &'a Paragraph>) -> String {
    let cells: Vec<String> = cells.map(paragraph_expr).collect();
    format!(
        "grid(columns: {columns}, row-gutter: {}, {})",
        pt(ROW_GUTTER),
        cells.join(", ")
    )
}

fn logo_expr(logo: &Logo) -> String {
    let size = pt(LOGO_SIZE);
    match logo {
        Logo::Image(asset) => format!(
            "image({}, width: {size}, height: {size}, fit: \"contain\")",
            string_literal(&asset.path)
        ),
        Logo::Placeholder => format!(
            "box(width: {size}, height: {size}, stroke: 1pt + {}, \
             align(center + horizon, text(size: 9pt, fill: {})[#\"(LOGO)\"]))",
            PLACEHOLDER_BORDER.to_typst(),
            PLACEHOLDER_TEXT.to_typst()
        ),
    }
}

/// A paragraph as a Typst code-mode expression.
pub fn paragraph_expr(paragraph: &Paragraph) -> String {
    let style = &paragraph.style;
    format!(
        "block(width: 100%, below: {})[#set par(leading: {});#set text({});{}]",
        pt(style.space_after),
        pt(style.line_gap()),
        style.text_args(),
        runs_markup(&paragraph.runs)
    )
}

/// Runs in markup mode. A blank line starts a new paragraph and a single
/// `\n` is a line break. Runs are joined without separators, so Typst sees
/// one unbroken stretch of text wherever the source had no space.
pub fn runs_markup(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        let text = run.text.replace("\r\n", "\n");
        for (p, block) in text.split("\n\n").enumerate() {
            if p > 0 {
                out.push_str("#parbreak()");
            }
            for (l, line) in block.split('\n').enumerate() {
                if l > 0 {
                    out.push_str("#linebreak()");
                }
                if line.is_empty() {
                    continue;
                }
                if run.bold {
                    out.push_str(&format!("#text(weight: \"bold\", {})", string_literal(line)));
                } else {
                    out.push('#');
                    out.push_str(&string_literal(line));
                }
            }
        }
    }
    out
}

/// Quote `text` as a Typst string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
