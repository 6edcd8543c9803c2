//! Table names declared by the schema module
//!
//! Tables live in `makeOwned({ ... })`-style maps as `name: object(` entries,
//! and child tables anywhere as `name: child(`. Names keep first-seen order.

use lazyconvex_codegen::scan::mask::mask;
use once_cell::sync::Lazy;
use regex::Regex;

/// Builders whose object argument maps table names to validators
const MAP_BUILDERS: &[&str] = &["makeOwned", "makeOrgScoped", "makeSingleton", "makeBase"];

static MAP_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(makeOwned|makeOrgScoped|makeSingleton|makeBase)\(\s*\{")
        .expect("map builder pattern should be valid")
});

static OBJECT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*object\(").expect("object entry pattern should be valid"));

static CHILD_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*child\(").expect("child entry pattern should be valid"));

/// Index just past the `}` closing a block whose body starts at `start`
fn block_end(text: &str, start: usize) -> usize {
    let mut depth = 1usize;
    for (offset, b) in text.as_bytes()[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return start + offset;
                }
            }
            _ => {}
        }
    }
    text.len()
}

fn push_unique(tables: &mut Vec<String>, name: &str) {
    if !tables.iter().any(|t| t == name) {
        tables.push(name.to_string());
    }
}

/// Every table name declared in `source`
pub fn extract_tables(source: &str) -> Vec<String> {
    let masked = mask(source);
    let mut tables = Vec::new();

    for builder in MAP_BUILDERS {
        for open in MAP_OPEN.captures_iter(&masked) {
            let (Some(name), Some(whole)) = (open.get(1), open.get(0)) else {
                continue;
            };
            if name.as_str() != *builder {
                continue;
            }
            let start = whole.end();
            let body = &masked[start..block_end(&masked, start)];
            for entry in OBJECT_ENTRY.captures_iter(body) {
                if let Some(table) = entry.get(1) {
                    push_unique(&mut tables, table.as_str());
                }
            }
        }
    }

    for entry in CHILD_ENTRY.captures_iter(&masked) {
        if let Some(table) = entry.get(1) {
            push_unique(&mut tables, table.as_str());
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"import { child, makeBase, makeOwned, makeOrgScoped } from 'lazyconvex'

const orgScoped = makeOrgScoped({
    wiki: object({ title: string(), status: string() })
  }),
  owned = makeOwned({
    blog: object({ title: string() }),
    // draft: object({ title: string() }),
    chat: object({ title: string() })
  }),
  base = makeBase({ movie: object({ tmdbId: number() }) }),
  children = {
    message: child({ foreignKey: 'chatId', parent: 'chat', schema: object({}) })
  }
"#;

    #[test]
    fn test_tables_in_builder_order() {
        assert_eq!(extract_tables(SCHEMA), vec!["blog", "chat", "wiki", "movie", "message"]);
    }

    #[test]
    fn test_commented_entries_ignored() {
        assert!(!extract_tables(SCHEMA).contains(&"draft".to_string()));
    }

    #[test]
    fn test_no_tables() {
        assert!(extract_tables("export const x = 1").is_empty());
    }
}
