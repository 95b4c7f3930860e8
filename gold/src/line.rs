//! Line classification helpers. Every function here is pure and works on a
//! single physical source line.

/// Replace every `\r\n` and lone `\r` with `\n`.
pub fn normalize_newlines(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// A line is blank when it holds nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Indentation depth of a line.
///
/// Each leading tab counts as one level and each pair of leading spaces counts
/// as one level. A lone space that is not followed by another space before the
/// first non-indent character adds nothing. Scanning stops at the first
/// character that is neither a tab nor a space.
pub fn indent_depth(line: &str) -> usize {
    let mut depth = 0;
    let mut pending_space = false;
    for ch in line.chars() {
        match ch {
            '\t' => depth += 1,
            ' ' => {
                if pending_space {
                    depth += 1;
                }
                pending_space = !pending_space;
            }
            _ => break,
        }
    }
    depth
}

pub fn is_top_level(line: &str) -> bool {
    indent_depth(line) == 0
}

/// `extends` directive test. Works on the untrimmed line.
pub fn is_extends(line: &str) -> bool {
    is_directive(line, "extends")
}

/// `block` directive test. Works on the untrimmed line.
pub fn is_block(line: &str) -> bool {
    is_directive(line, "block")
}

fn is_directive(line: &str, keyword: &str) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

/// Split a directive line on single spaces after trimming it.
///
/// Consecutive spaces yield empty tokens, so `extends  base` has three tokens.
pub fn directive_tokens(line: &str) -> Vec<&str> {
    line.trim().split(' ').collect()
}
