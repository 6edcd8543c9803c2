//! Comment and string-literal masking
//!
//! Delimiter and keyword scanning must not see text inside comments or string
//! literals. [`mask`] blanks those regions with spaces while keeping every
//! byte offset and newline in place, so a position found in the masked text
//! indexes the original source as well. Quote characters are kept.
//!
//! Regular-expression literals are not recognized.

/// Blank comments and string-literal contents in `source`
pub fn mask(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p);
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = bytes[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
                blank(&mut out, i, end);
                i = end;
            }
            b'"' | b'\'' => {
                let (content_end, next) = skip_quoted(bytes, i);
                blank(&mut out, i + 1, content_end);
                i = next;
            }
            b'`' => {
                let (content_end, next) = skip_template(bytes, i);
                blank(&mut out, i + 1, content_end);
                i = next;
            }
            _ => i += 1,
        }
    }

    // Only whole characters between ASCII delimiters were replaced.
    String::from_utf8(out).unwrap_or_else(|_| source.to_string())
}

fn blank(out: &mut [u8], from: usize, to: usize) {
    let to = to.min(out.len());
    for b in out.iter_mut().take(to).skip(from) {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

/// Returns `(content_end, next)` for a quoted literal starting at `start`.
/// An unterminated literal stops at the end of its line.
fn skip_quoted(bytes: &[u8], start: usize) -> (usize, usize) {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return (i, i),
            b if b == quote => return (i, i + 1),
            _ => i += 1,
        }
    }
    (bytes.len(), bytes.len())
}

fn skip_template(bytes: &[u8], start: usize) -> (usize, usize) {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return (i, i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => i = skip_interpolation(bytes, i + 2),
            _ => i += 1,
        }
    }
    (bytes.len(), bytes.len())
}

fn skip_interpolation(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'"' | b'\'' => {
                i = skip_quoted(bytes, i).1;
                continue;
            }
            b'`' => {
                i = skip_template(bytes, i).1;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_offsets() {
        let source = "const a = \"{(\" // } )\nconst b = 'x' /* { \n } */ + `t ${c} }`\n";
        let masked = mask(source);
        assert_eq!(masked.len(), source.len());
        assert_eq!(
            masked.match_indices('\n').collect::<Vec<_>>(),
            source.match_indices('\n').collect::<Vec<_>>()
        );
        assert_eq!(masked.matches(['{', '}', '(', ')']).count(), 0);
        assert!(masked.starts_with("const a = \"  \""));
    }

    #[test]
    fn test_escaped_quote_stays_inside_literal() {
        let masked = mask(r#"f("a\"(b") + g"#);
        assert_eq!(masked, r#"f("     ") + g"#);
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let masked = mask("x = 'oops\ny = {}");
        assert!(masked.ends_with("y = {}"));
    }

    #[test]
    fn test_multibyte_text_inside_literal() {
        let source = "const s = \"héllo {\"; const t = {}";
        let masked = mask(source);
        assert_eq!(masked.len(), source.len());
        assert!(masked.ends_with("const t = {}"));
        assert_eq!(masked.matches('{').count(), 1);
    }
}
