//! Human-readable error rendering
//!
//! Turns a positioned [`Error`] plus the source it came from into a short
//! quote: location header, the offending line with leading whitespace
//! trimmed, and a caret under the offending byte. Tabs in the quoted line
//! are preserved in the caret's indentation so the caret stays aligned in
//! any terminal; very long lines are windowed around the caret.

use bliks_core::Error;

/// Maximum number of characters quoted from a single line.
const WINDOW: usize = 60;

/// Render an error against its source. `source_name` is whatever the host
/// calls this source (a file path, "repl", ...).
pub fn format_error(err: &Error, source: &str, source_name: &str) -> String {
    // Clamp to a char boundary inside the source; the position may sit one
    // past the end (errors at EOF).
    let mut pos = err.pos.saturating_sub(1).min(source.len());
    while pos > 0 && !source.is_char_boundary(pos) {
        pos -= 1;
    }

    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[pos..].find('\n').map_or(source.len(), |i| pos + i);
    let line_no = source[..line_start].matches('\n').count() + 1;

    let raw = source[line_start..line_end].trim_end_matches('\r');
    let trimmed = raw.trim_start();
    let lead = raw.len() - trimmed.len();
    let col = pos
        .saturating_sub(line_start + lead)
        .min(trimmed.len());

    let chars: Vec<char> = trimmed.chars().collect();
    let caret = trimmed[..col].chars().count();
    let (display, caret) = window(&chars, caret);

    let mut indent = String::with_capacity(caret);
    for c in display.chars().take(caret) {
        indent.push(if c == '\t' { '\t' } else { ' ' });
    }

    format!(
        "{source_name}:{line_no}:{}: {}\n  {display}\n  {indent}^",
        col + 1,
        err.message
    )
}

/// Slice a window of at most [`WINDOW`] characters around the caret,
/// marking truncation with ellipses. Returns the text and the caret's
/// offset within it.
fn window(chars: &[char], caret: usize) -> (String, usize) {
    if chars.len() <= WINDOW {
        return (chars.iter().collect(), caret);
    }
    let start = caret
        .saturating_sub(WINDOW / 2)
        .min(chars.len() - WINDOW);
    let end = start + WINDOW;

    let mut text = String::new();
    let mut offset = caret - start;
    if start > 0 {
        text.push_str("...");
        offset += 3;
    }
    text.extend(&chars[start..end]);
    if end < chars.len() {
        text.push_str("...");
    }
    (text, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_quote() {
        let source = "set 1 0\nadd 3.2 3 3\n";
        let err = Error::new("function expects a pointer for argument 1", 13);
        let rendered = format_error(&err, source, "demo.bliks");
        assert_eq!(
            rendered,
            "demo.bliks:2:5: function expects a pointer for argument 1\n\
             \x20 add 3.2 3 3\n\
             \x20     ^"
        );
    }

    #[test]
    fn test_leading_whitespace_is_trimmed() {
        let source = "    add 3.2 3 3";
        let err = Error::new("bad", 9);
        let rendered = format_error(&err, source, "x");
        assert_eq!(rendered, "x:1:5: bad\n  add 3.2 3 3\n      ^");
    }

    #[test]
    fn test_tabs_survive_in_the_caret_indent() {
        let source = "\tadd\t3.2 3";
        let err = Error::new("bad", 6); // points at 3.2
        let rendered = format_error(&err, source, "x");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "  add\t3.2 3");
        assert_eq!(lines[2], "  \x20\x20\x20\t^");
    }

    #[test]
    fn test_position_at_end_of_source() {
        let source = "write \"abc";
        let err = Error::new("unterminated string literal", 11);
        let rendered = format_error(&err, source, "x");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "  write \"abc");
        assert_eq!(lines[2], "            ^");
    }

    #[test]
    fn test_long_lines_are_windowed() {
        let mut source = String::from("concat 1");
        for _ in 0..40 {
            source.push_str(" \"xxxx\"");
        }
        source.push_str(" oops");
        let pos = source.len() - 3; // inside "oops"
        let err = Error::new("bad", pos);
        let rendered = format_error(&err, &source, "x");
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[1].starts_with("  ..."));
        assert!(lines[1].contains("oops"));
        assert!(lines[1].len() <= WINDOW + 2 + 6);
        // caret still under the 'o'
        let caret_at = lines[2].find('^').unwrap();
        assert_eq!(lines[1].as_bytes()[caret_at], b'o');
    }

    #[test]
    fn test_window_start_truncation_only() {
        let mut source = "x".repeat(100);
        source.push_str(" tail");
        let err = Error::new("bad", source.len() - 3);
        let rendered = format_error(&err, &source, "x");
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].starts_with("  ..."));
        assert!(!lines[1].ends_with("..."));
        assert!(lines[1].contains("tail"));
    }

    #[test]
    fn test_empty_source() {
        let err = Error::new("nothing to do", 1);
        let rendered = format_error(&err, "", "x");
        assert_eq!(rendered, "x:1:1: nothing to do\n  \n  ^");
    }
}
