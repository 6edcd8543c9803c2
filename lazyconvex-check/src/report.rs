//! Consistency issues and their rendering

use std::collections::HashMap;
use std::fmt::Write as _;

use colored::Colorize;
use lazyconvex_codegen::ir::FactoryCall;
use lazyconvex_codegen::scan::endpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

/// One finding, attributed to the file it was seen in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub level: Level,
    pub file: String,
    pub message: String,
}

impl Issue {
    fn error(file: &str, message: String) -> Self {
        Issue {
            level: Level::Error,
            file: file.to_string(),
            message,
        }
    }

    fn warning(file: &str, message: String) -> Self {
        Issue {
            level: Level::Warning,
            file: file.to_string(),
            message,
        }
    }
}

/// Cross-check schema tables against factory calls
///
/// `files` are the checked module file names; `schema_file` is the name
/// schema-side warnings are attributed to.
pub fn check(tables: &[String], schema_file: &str, calls: &[FactoryCall], files: &[String]) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for call in calls {
        match seen.get(call.table.as_str()) {
            Some(first) => issues.push(Issue::error(
                &call.file,
                format!("Duplicate factory for table \"{}\" (also in {first})", call.table),
            )),
            None => {
                seen.insert(&call.table, &call.file);
            }
        }

        if !tables.contains(&call.table) {
            issues.push(Issue::error(
                &call.file,
                format!(
                    "{}('{}') but no \"{}\" table found in schema",
                    call.kind, call.table, call.table
                ),
            ));
        }
    }

    for table in tables {
        if !seen.contains_key(table.as_str()) {
            issues.push(Issue::warning(
                schema_file,
                format!("Table \"{table}\" defined in schema but no factory call found"),
            ));
        }
    }

    let stems: Vec<&str> = files
        .iter()
        .map(|f| f.strip_suffix(".ts").unwrap_or(f))
        .collect();
    for call in calls {
        let stem = call.file.strip_suffix(".ts").unwrap_or(&call.file);
        if call.table != stem && !stems.contains(&call.table.as_str()) {
            issues.push(Issue::warning(
                &call.file,
                format!(
                    "{}('{}') in {}: table name doesn't match filename",
                    call.kind, call.table, call.file
                ),
            ));
        }
    }

    issues
}

/// Count of errors in `issues`
pub fn error_count(issues: &[Issue]) -> usize {
    issues.iter().filter(|i| i.level == Level::Error).count()
}

/// Render `issues`, errors first, followed by the totals line
pub fn render_issues(issues: &[Issue]) -> String {
    let mut out = String::new();
    if issues.is_empty() {
        let _ = writeln!(out, "{}\n", "✓ All checks passed".green());
        return out;
    }

    let errors: Vec<&Issue> = issues.iter().filter(|i| i.level == Level::Error).collect();
    let warnings: Vec<&Issue> = issues.iter().filter(|i| i.level == Level::Warning).collect();

    for issue in &errors {
        let _ = writeln!(out, "{} {} {}", "✗".red(), issue.file.dimmed(), issue.message);
    }
    for issue in &warnings {
        let _ = writeln!(out, "{} {} {}", "⚠".yellow(), issue.file.dimmed(), issue.message);
    }

    let mut totals = Vec::new();
    if !errors.is_empty() {
        totals.push(format!("{} error(s)", errors.len()).red().to_string());
    }
    if !warnings.is_empty() {
        totals.push(format!("{} warning(s)", warnings.len()).yellow().to_string());
    }
    let _ = writeln!(out, "\n{}\n", totals.join(", "));
    out
}

/// Render each factory call's endpoints and the total
///
/// Prefixed endpoints such as `pub.list` are grouped on their own line.
pub fn render_endpoints(calls: &[FactoryCall]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", "Generated Endpoints".bold());

    let mut total = 0;
    for call in calls {
        let eps = endpoints(call);
        total += eps.len();
        let _ = writeln!(
            out,
            "  {} {} {}",
            call.table.bold(),
            format!("({})", call.kind).dimmed(),
            format!("in {}", call.file).dimmed()
        );

        let mut plain = Vec::new();
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for ep in &eps {
            match ep.split_once('.') {
                Some((prefix, name)) if !prefix.is_empty() => {
                    match groups.iter_mut().find(|(p, _)| *p == prefix) {
                        Some((_, names)) => names.push(name),
                        None => groups.push((prefix, vec![name])),
                    }
                }
                _ => plain.push(ep.as_str()),
            }
        }

        if !plain.is_empty() {
            let _ = writeln!(out, "    {}", plain.join(", "));
        }
        for (prefix, names) in groups {
            let prefix = format!("{prefix}.").dimmed().to_string();
            let line: Vec<String> = names.iter().map(|n| format!("{prefix}{n}")).collect();
            let _ = writeln!(out, "    {}", line.join(", "));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} endpoints from {} factory calls\n",
        total.to_string().bold(),
        calls.len().to_string().bold()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyconvex_codegen::scan::find_factory_calls;

    fn calls(files: &[(&str, &str)]) -> Vec<FactoryCall> {
        files
            .iter()
            .flat_map(|(file, text)| find_factory_calls(file, text))
            .collect()
    }

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_clean_project_has_no_issues() {
        let calls = calls(&[("blog.ts", "crud('blog', owned.blog)")]);
        let issues = check(&tables(&["blog"]), "t.ts", &calls, &files(&["blog.ts"]));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_duplicate_and_unknown_tables_are_errors() {
        let calls = calls(&[
            ("blog.ts", "crud('blog', owned.blog)"),
            ("post.ts", "crud('blog', owned.blog)\norgCrud('ghost', orgScoped.ghost)"),
        ]);
        let issues = check(
            &tables(&["blog"]),
            "t.ts",
            &calls,
            &files(&["blog.ts", "post.ts"]),
        );

        assert_eq!(
            issues[0],
            Issue::error("post.ts", "Duplicate factory for table \"blog\" (also in blog.ts)".into())
        );
        assert_eq!(
            issues[1],
            Issue::error("post.ts", "orgCrud('ghost') but no \"ghost\" table found in schema".into())
        );
        assert_eq!(error_count(&issues), 2);
    }

    #[test]
    fn test_missing_factory_and_filename_mismatch_are_warnings() {
        let calls = calls(&[("posts.ts", "crud('blog', owned.blog)")]);
        let issues = check(
            &tables(&["blog", "wiki"]),
            "t.ts",
            &calls,
            &files(&["posts.ts"]),
        );

        assert_eq!(error_count(&issues), 0);
        assert_eq!(
            issues,
            vec![
                Issue::warning("t.ts", "Table \"wiki\" defined in schema but no factory call found".into()),
                Issue::warning("posts.ts", "crud('blog') in posts.ts: table name doesn't match filename".into()),
            ]
        );
    }

    #[test]
    fn test_table_matching_another_module_is_not_a_mismatch() {
        let calls = calls(&[("lazy.ts", "crud('blog', owned.blog)")]);
        let issues = check(&tables(&["blog"]), "t.ts", &calls, &files(&["blog.ts", "lazy.ts"]));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_render_totals() {
        colored::control::set_override(false);
        let issues = vec![
            Issue::error("a.ts", "bad".into()),
            Issue::warning("b.ts", "odd".into()),
        ];
        assert_eq!(render_issues(&issues), "✗ a.ts bad\n⚠ b.ts odd\n\n1 error(s), 1 warning(s)\n\n");
        assert_eq!(render_issues(&[]), "✓ All checks passed\n\n");
    }

    #[test]
    fn test_render_endpoints_groups_public_variants() {
        colored::control::set_override(false);
        let calls = calls(&[("blog.ts", "crud('blog', owned.blog, { search: 'title' })")]);
        let out = render_endpoints(&calls);

        assert!(out.starts_with("Generated Endpoints\n\n  blog (crud) in blog.ts\n"));
        assert!(out.contains("    create, update, rm, bulkCreate, bulkRm, bulkUpdate\n"));
        assert!(out.contains("    pub.list, pub.read, pub.search\n"));
        assert!(out.ends_with("9 endpoints from 1 factory calls\n\n"));
    }
}
