//! Factory-call analysis
//!
//! Finds `crud('table', ...)`-style calls in a module source, captures the
//! option text up to the matching `)` and derives the endpoint list each call
//! wires into the backend.

use once_cell::sync::Lazy;
use regex::Regex;

use super::mask::mask;
use crate::ir::{FactoryCall, FactoryKind, FactoryOptions};

static FACTORY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(crud|orgCrud|childCrud|cacheCrud|singletonCrud)\s*\(\s*(['"])"#)
        .expect("factory call regex should be valid")
});

/// An option key written as a property (`search: ...`) or shorthand (`{ acl }`)
static OPTION_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(search|softDelete|acl|pub)\s*[:,})]").expect("option key regex should be valid")
});

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+$").expect("table name regex should be valid"));

const CRUD_BASE: &[&str] = &["create", "update", "rm", "bulkCreate", "bulkRm", "bulkUpdate"];
const CRUD_PUB: &[&str] = &["pub.list", "pub.read"];
const ORG_CRUD_BASE: &[&str] = &[
    "list",
    "read",
    "create",
    "update",
    "rm",
    "bulkCreate",
    "bulkRm",
    "bulkUpdate",
];
const ORG_ACL: &[&str] = &["addEditor", "removeEditor", "setEditors", "editors"];
const CHILD_BASE: &[&str] = &["list", "create", "update", "rm", "bulkCreate", "bulkRm", "bulkUpdate"];
const CACHE_BASE: &[&str] = &[
    "get",
    "all",
    "list",
    "create",
    "update",
    "rm",
    "invalidate",
    "purge",
    "load",
    "refresh",
];
const SINGLETON_BASE: &[&str] = &["get", "upsert"];

/// Every factory call in `source`, in source order
///
/// `file` is recorded on each call for reporting. Calls whose first argument
/// is not a plain word literal are skipped.
pub fn find_factory_calls(file: &str, source: &str) -> Vec<FactoryCall> {
    let masked = mask(source);
    let mut calls = Vec::new();

    for caps in FACTORY_CALL.captures_iter(&masked) {
        let (Some(name), Some(quote)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(kind) = FactoryKind::from_name(name.as_str()) else {
            continue;
        };

        let literal_start = quote.end();
        let Some(close) = masked[literal_start..].find(quote.as_str()) else {
            continue;
        };
        let literal_end = literal_start + close;
        let table = &source[literal_start..literal_end];
        if !TABLE_NAME.is_match(table) {
            continue;
        }

        let options_start = literal_end + 1;
        let options_end = closing_paren(&masked, options_start);
        let options_masked = &masked[options_start..options_end];

        calls.push(FactoryCall {
            kind,
            table: table.to_string(),
            file: file.to_string(),
            options_text: source[options_start..options_end].to_string(),
            options: detect_options(options_masked),
        });
    }

    calls
}

/// Detect option flags in the text following a factory's table literal
pub fn detect_options(options_text: &str) -> FactoryOptions {
    let mut options = FactoryOptions::default();
    for caps in OPTION_KEY.captures_iter(options_text) {
        match caps.get(1).map(|m| m.as_str()) {
            Some("search") => options.search = true,
            Some("softDelete") => options.soft_delete = true,
            Some("acl") => options.acl = true,
            Some("pub") => options.public = true,
            _ => {}
        }
    }
    options
}

/// Index of the `)` closing a call whose arguments continue at `start`
///
/// Depth starts at one; an unbalanced call runs to the end of the text.
fn closing_paren(text: &str, start: usize) -> usize {
    let mut depth = 1usize;
    for (offset, b) in text.as_bytes()[start..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
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

/// Endpoints a factory call exposes, in a stable order
///
/// Public variants carry a `pub.` prefix.
pub fn endpoints(call: &FactoryCall) -> Vec<String> {
    let opts = call.options;
    let mut eps: Vec<&str> = Vec::new();

    match call.kind {
        FactoryKind::SingletonCrud => eps.extend(SINGLETON_BASE),
        FactoryKind::CacheCrud => eps.extend(CACHE_BASE),
        FactoryKind::ChildCrud => {
            eps.extend(CHILD_BASE);
            if opts.public {
                eps.extend(["pub.list", "pub.get"]);
            }
        }
        FactoryKind::OrgCrud => {
            eps.extend(ORG_CRUD_BASE);
            if opts.acl {
                eps.extend(ORG_ACL);
            }
            if opts.soft_delete {
                eps.push("restore");
            }
            if opts.search {
                eps.push("search");
            }
        }
        FactoryKind::Crud => {
            eps.extend(CRUD_BASE);
            eps.extend(CRUD_PUB);
            if opts.search {
                eps.push("pub.search");
            }
            if opts.soft_delete {
                eps.push("restore");
            }
        }
    }

    eps.into_iter().map(String::from).collect()
}
