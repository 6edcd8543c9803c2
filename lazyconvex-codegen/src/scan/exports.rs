//! Exported-name extraction
//!
//! Two source forms export backend functions:
//!
//! - `export const <binding> = ...` (or `let`), where the binding is an
//!   identifier or a destructuring pattern, possibly followed by more
//!   comma-separated bindings
//! - a trailing `export { a, b as c }` block
//!
//! Scanning runs on masked text (see [`super::mask`]) so delimiters inside
//! comments and string literals never shift nesting depth.

use once_cell::sync::Lazy;
use regex::Regex;

use super::mask::mask;

static EXPORT_BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexport\s+(?:const|let)\s").expect("export binding regex should be valid"));

static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}").expect("export list regex should be valid"));

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("identifier regex should be valid"));

/// Exported names of a module source, deduplicated in first-seen order
pub fn exported_names(source: &str) -> Vec<String> {
    let masked = mask(source);
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !names.contains(&name) {
            names.push(name);
        }
    };

    for m in EXPORT_BINDING.find_iter(&masked) {
        let statement = statement_at(&masked, m.end());
        for name in binding_names(statement) {
            push(name);
        }
    }

    for caps in EXPORT_LIST.captures_iter(&masked) {
        let Some(list) = caps.get(1) else { continue };
        for entry in split_top_level(list.as_str(), b',') {
            if let Some(name) = export_list_entry(entry) {
                push(name);
            }
        }
    }

    names
}

/// Text of the statement starting at `start`
///
/// The statement ends at an unmatched closer, or at a newline outside any
/// nesting unless the next non-blank text continues it with `,` or `{`.
fn statement_at(text: &str, start: usize) -> &str {
    let bytes = text.as_bytes();
    let mut open: Vec<u8> = Vec::new();
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'{' | b'[' => open.push(bytes[i]),
            b')' | b'}' | b']' => {
                if open.pop().is_none() {
                    break;
                }
            }
            b'\n' if open.is_empty() => {
                let rest = text[i + 1..].trim_start();
                if !(rest.starts_with(',') || rest.starts_with('{')) {
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }

    &text[start..i]
}

/// Names declared by a binding list such as `a = 1, { b, c: d } = f()`
fn binding_names(statement: &str) -> Vec<String> {
    let mut names = Vec::new();
    for declarator in split_declarators(statement) {
        let target = declarator_target(declarator);
        collect_pattern(target, &mut names);
    }
    names
}

/// Split a declaration list into declarators
///
/// Like [`split_top_level`] on `,`, except that commas between the `<` and
/// `>` of a type annotation (`a: Map<K, V> = ...`) do not split.
fn split_declarators(statement: &str) -> Vec<&str> {
    let bytes = statement.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut in_annotation = false;
    let mut initialized = false;
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth -= 1,
            _ if depth > 0 => {}
            b':' if !in_annotation && !initialized => in_annotation = true,
            b'<' if in_annotation => angle += 1,
            // `=>` in a function type is not a closing bracket
            b'>' if in_annotation && i > 0 && bytes[i - 1] != b'=' => angle = (angle - 1).max(0),
            b'=' if bytes.get(i + 1) != Some(&b'>') && angle == 0 => {
                in_annotation = false;
                initialized = true;
            }
            b',' if angle == 0 => {
                parts.push(&statement[start..i]);
                start = i + 1;
                in_annotation = false;
                initialized = false;
            }
            _ => {}
        }
    }
    parts.push(&statement[start..]);
    parts
}

/// Binding target of one declarator: text before the type annotation or `=`
fn declarator_target(declarator: &str) -> &str {
    let declarator = declarator.trim();
    if declarator.starts_with('{') || declarator.starts_with('[') {
        return match matching_close(declarator, 0) {
            Some(end) => &declarator[..=end],
            None => declarator,
        };
    }
    let end = declarator
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(declarator.len());
    &declarator[..end]
}

/// Collect the names bound by a pattern (identifier, object or array)
fn collect_pattern(pattern: &str, names: &mut Vec<String>) {
    let pattern = pattern.trim();
    if let Some(inner) = strip_delimiters(pattern, '{', '}') {
        for element in split_top_level(inner, b',') {
            collect_object_element(element, names);
        }
    } else if let Some(inner) = strip_delimiters(pattern, '[', ']') {
        for element in split_top_level(inner, b',') {
            let element = element.trim();
            let element = element.strip_prefix("...").unwrap_or(element);
            collect_pattern(strip_default(element), names);
        }
    } else if IDENT.is_match(pattern) {
        names.push(pattern.to_string());
    }
}

/// One entry of an object pattern: `a`, `a = 1`, `a: b`, `a: { b }`, `...rest`
fn collect_object_element(element: &str, names: &mut Vec<String>) {
    let element = element.trim();
    if element.is_empty() {
        return;
    }
    if let Some(rest) = element.strip_prefix("...") {
        collect_pattern(rest, names);
        return;
    }
    match find_top_level(element, b':') {
        Some(colon) => collect_pattern(strip_default(&element[colon + 1..]), names),
        None => {
            let shorthand = strip_default(element);
            let shorthand = shorthand.split(" as ").next().unwrap_or(shorthand);
            collect_pattern(shorthand, names);
        }
    }
}

/// One entry of `export { ... }`: the right-hand name of `a as b`, else `a`
fn export_list_entry(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() || entry.starts_with("type ") {
        return None;
    }
    let name = match entry.rsplit_once(" as ") {
        Some((_, renamed)) => renamed.trim(),
        None => entry,
    };
    IDENT.is_match(name).then(|| name.to_string())
}

fn strip_delimiters(text: &str, open: char, close: char) -> Option<&str> {
    text.strip_prefix(open)?.strip_suffix(close)
}

/// Drop a top-level `= default` suffix
fn strip_default(text: &str) -> &str {
    match find_top_level(text, b'=') {
        Some(eq) => text[..eq].trim(),
        None => text.trim(),
    }
}

/// Index of the bracket closing the one opened at `start`
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// First index of `needle` outside any nesting
fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let mut depth = 0i32;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth -= 1,
            _ if b == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `separator` outside any nesting
pub(crate) fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth -= 1,
            _ if b == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvests_consts_destructuring_and_export_list() {
        let source = r#"
import { helper } from './lib'

export const a = query({ handler: async () => [] })
export const { a: b, c } = helper()
const x = 1, y = 2

export { x, y as z }
"#;
        assert_eq!(exported_names(source), vec!["a", "b", "c", "x", "z"]);
    }

    #[test]
    fn test_multiline_destructuring_from_factory() {
        let source = r#"
export const {
    create,
    list,
    read,
    rm,
    update
  } = orgCrud('wiki', orgScoped.wiki, { softDelete: false })
"#;
        assert_eq!(
            exported_names(source),
            vec!["create", "list", "read", "rm", "update"]
        );
    }

    #[test]
    fn test_nested_and_rest_patterns() {
        let source = "export const { pub: { list: publicList, read }, auth: [first, , third = 1], ...rest } = make()\n";
        assert_eq!(
            exported_names(source),
            vec!["publicList", "read", "first", "third", "rest"]
        );
    }

    #[test]
    fn test_leading_comma_continuation_and_multiple_declarators() {
        let source = "export const a = f(), b = g({ x: 1 })\n  , c = 3\nconst hidden = 4\n";
        assert_eq!(exported_names(source), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_type_annotations_are_not_names() {
        let source = "export const upload: Mutation = mutation({ handler })\n";
        assert_eq!(exported_names(source), vec!["upload"]);

        let source = "export const limits: Record<string, number> = {}\nexport const pair: Map<string, boolean> = new Map()\n";
        assert_eq!(exported_names(source), vec!["limits", "pair"]);

        let source = "export const a: Map<string, Array<number>> = m(), b: (x: number, y: number) => Pair<number, string> = f\n";
        assert_eq!(exported_names(source), vec!["a", "b"]);
    }

    #[test]
    fn test_ignores_comments_and_strings() {
        let source = r#"
// export const ghost = 1
/* export const other = 2 */
export const label = "export const fake = '{'"
export const real = 3
"#;
        assert_eq!(exported_names(source), vec!["label", "real"]);
    }

    #[test]
    fn test_export_list_skips_types_and_invalid_names() {
        let source = "export { type Foo, alpha, beta as gamma, 9bad }\n";
        assert_eq!(exported_names(source), vec!["alpha", "gamma"]);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let source = "export const a = 1\nexport { a }\n";
        assert_eq!(exported_names(source), vec!["a"]);
    }
}
