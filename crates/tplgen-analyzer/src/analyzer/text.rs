//! JSX text handling.

use tplgen_ir::html::decode_entities;

/// Apply JSX whitespace rules to raw JSX text and decode entities.
///
/// Lines are trimmed (except the outer edges of the first and last line),
/// whitespace-only lines dropped and the rest joined with a single space.
pub fn clean_jsx_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last = lines.len().saturating_sub(1);
    let mut out = String::new();

    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = *line;
        if i != 0 {
            trimmed = trimmed.trim_start_matches([' ', '\t']);
        }
        if i != last {
            trimmed = trimmed.trim_end_matches([' ', '\t']);
        }
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(trimmed);
    }

    decode_entities(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_line_keeps_spaces() {
        assert_eq!(clean_jsx_text(" Hello "), " Hello ");
    }

    #[test]
    fn test_multiline_collapses() {
        assert_eq!(clean_jsx_text("\n    Hello\n    world\n  "), "Hello world");
        assert_eq!(clean_jsx_text("\n   \n  "), "");
    }

    #[test]
    fn test_entities() {
        assert_eq!(clean_jsx_text("Fish &amp; chips"), "Fish & chips");
    }
}
