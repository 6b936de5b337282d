//! Human readable rendering of compile errors.

use text_lines::TextLines;
use unicode_width::UnicodeWidthStr;

use aurora_codegen::CompileError;

/// Render `error` with the offending source line and a caret under the
/// token that caused it.
///
/// ```text
/// error: Unexpected token ')' at line 2.
///   |
/// 2 | y = )
///   |     ^
/// ```
pub fn render_compile_error(source: &str, error: &CompileError) -> String {
    let lines = TextLines::new(source);
    let start = error.span.start.min(source.len());
    let line_index = lines.line_index(start);
    let line_start = lines.line_start(line_index).min(start);
    let line_end = lines.line_end(line_index).clamp(start, source.len());
    let line_text = source[line_start..line_end].trim_end_matches(&['\n', '\r'][..]);

    let column = line_text
        .get(..start - line_start)
        .map_or(0, UnicodeWidthStr::width);
    let token_end = error.span.end.clamp(start, line_start + line_text.len());
    let carets = source
        .get(start..token_end)
        .map_or(0, UnicodeWidthStr::width)
        .max(1);

    let gutter = (line_index + 1).to_string();
    let pad = " ".repeat(gutter.len());
    format!(
        "error: {}\n{} |\n{} | {}\n{} | {}{}\n",
        error,
        pad,
        gutter,
        line_text,
        pad,
        " ".repeat(column),
        "^".repeat(carets)
    )
}
