//! End-to-end generation over a fixture backend

use std::fs;
use std::path::{Path, PathBuf};

use lazyconvex_codegen::{GenerateOptions, GeneratorError, generate, run};
use tempfile::TempDir;

const SCHEMA: &str = r#"{
  "owned": {
    "blog": {"type": "object", "shape": {
      "title": {"type": "string"},
      "content": {"type": "string"},
      "category": {"type": "enum", "values": ["tech", "life", "tutorial"]},
      "published": {"type": "boolean"},
      "coverImage": {"type": "optional", "innerType": {"type": "custom"}}
    }}
  },
  "orgScoped": {
    "wiki": {"type": "object", "shape": {
      "title": {"type": "string"},
      "status": {"type": "enum", "values": ["draft", "published"]}
    }}
  },
  "base": {
    "movie": {"type": "object", "shape": {
      "title": {"type": "string"},
      "tmdbId": {"type": "number"}
    }}
  },
  "singleton": {
    "profile": {"type": "object", "shape": {
      "bio": {"type": "optional", "innerType": {"type": "string"}},
      "theme": {"type": "enum", "values": ["light", "dark"]}
    }}
  },
  "children": {
    "message": {"foreignKey": "chatId", "schema": {"type": "object", "shape": {
      "chatId": {"type": "string"},
      "role": {"type": "enum", "values": ["user", "assistant"]},
      "parts": {"type": "array", "element": {"type": "union", "options": [
        {"type": "object", "shape": {"type": {"type": "literal", "values": ["text"]}, "text": {"type": "string"}}},
        {"type": "object", "shape": {"type": {"type": "literal", "values": ["image"]}, "image": {"type": "custom"}}}
      ]}}
    }}}
  }
}"#;

const MODULES: &[(&str, &str)] = &[
    (
        "blog.ts",
        "import { crud } from '../lazy'\n\nexport const { create, update, rm, read, list, bulkRm } = crud('blog', owned.blog)\n",
    ),
    (
        "wiki.ts",
        "export const {\n  create,\n  list,\n  read,\n  rm,\n  update\n} = orgCrud('wiki', orgScoped.wiki)\n",
    ),
    (
        "profile.ts",
        "export const { get, upsert } = singletonCrud('profile', singleton.profile)\n",
    ),
    (
        "message.ts",
        "const m = childCrud('message', children.message)\nexport const create = m.create\nexport const list = m.list\n",
    ),
    (
        "movie.ts",
        "const c = cacheCrud('movie', base.movie)\nexport const { get } = c\nexport const load = action(async () => {})\nexport { search }\n",
    ),
    (
        "org.ts",
        "export const myOrgs = q()\nexport const membership = q()\nexport const members = q()\nexport const invite = m()\nexport const getOrCreate = m()\n",
    ),
    ("file.ts", "export const upload = mutation({ handler: async () => '' })\n"),
    ("auth.ts", "export const signIn = () => {}\n"),
    ("blog.test.ts", "export const shouldNotAppear = 1\n"),
    ("helpers.ts", "const internal = 1\n"),
];

const CUSTOM: &str = r#"{
  "version": 1,
  "functions": {
    "movie": [
      {"fn": "load", "kind": "action", "returnType": "Movie", "skipMethod": "actionMovie",
       "args": [{"name": "tmdbId", "swiftType": "Int", "wireName": "tmdb_id", "wireExpr": "Double(tmdbId)"}]},
      {"fn": "search", "kind": "action", "returnType": "[Movie]",
       "args": [{"name": "query", "swiftType": "String"}]}
    ]
  },
  "subscriptions": {
    "blog": [
      {"methodName": "subscribeList", "fn": "list", "swiftType": "PaginatedResult<Blog>",
       "paginated": true, "skipMethod": "subscribePaginatedBlogs", "whereType": "BlogWhere"}
    ]
  }
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let convex = dir.path().join("convex");
        fs::create_dir_all(convex.join("_generated")).unwrap();
        fs::write(convex.join("_generated/api.ts"), "export const api = {}\n").unwrap();
        for (file, text) in MODULES {
            fs::write(convex.join(file), text).unwrap();
        }
        fs::write(dir.path().join("schema.json"), SCHEMA).unwrap();
        fs::write(dir.path().join("custom.json"), CUSTOM).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            schema: self.path("schema.json"),
            convex: self.path("convex"),
            output: self.path("out/Api.swift"),
            mobile_output: Some(self.path("out/MobileApi.swift")),
            custom: Some(self.path("custom.json")),
        }
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_blog_scenario() {
    let fixture = Fixture::new();
    let generated = generate(&fixture.options()).unwrap();
    let full = &generated.full;

    assert!(full.contains(
        "public struct Blog: Codable, Identifiable, Sendable {\n    public let _id: String\n    public let _creationTime: Double\n    public let author: Author?\n    public let updatedAt: Double\n    public let userId: String\n    public let title: String\n    public let content: String\n    public let category: BlogCategory\n    public let published: Bool\n    public let coverImage: String?\n    public let coverImageUrl: String?\n"
    ));
    assert!(full.contains(
        "public enum BlogCategory: String, CaseIterable, Codable, Sendable {\n    case life\n    case tech\n    case tutorial\n"
    ));

    let blog_api = section(full, "public enum BlogAPI {");
    for function in ["list", "create", "update", "rm", "read", "bulkRm"] {
        assert!(
            blog_api.contains(&format!("public static func {function}(")),
            "missing {function}"
        );
    }
    assert!(!blog_api.contains("func search("));
    assert!(!blog_api.contains("func restore("));
    assert!(blog_api.contains("\"category\": category.rawValue"));
    assert!(blog_api.contains("if let coverImage { args[\"coverImage\"] = coverImage }"));
}

#[test]
fn test_org_scoped_endpoint_fidelity() {
    let fixture = Fixture::new();
    let generated = generate(&fixture.options()).unwrap();
    let wiki_api = section(&generated.full, "public enum WikiAPI {");

    let functions: Vec<&str> = wiki_api
        .lines()
        .filter_map(|l| l.trim().strip_prefix("public static func "))
        .filter_map(|l| l.split('(').next())
        .collect();
    assert_eq!(functions, vec!["listArgs", "list", "create", "update", "rm", "read"]);
    assert!(!wiki_api.contains("Editor"));
}

#[test]
fn test_custom_functions_and_catalog() {
    let fixture = Fixture::new();
    let generated = generate(&fixture.options()).unwrap();
    let full = &generated.full;

    let message_api = section(full, "public enum MessageAPI {");
    assert!(message_api.contains("for p in parts {"));
    assert!(message_api.contains("var d: [String: Any] = [\"type\": p.type.rawValue]"));
    assert!(message_api.contains("if let text = p.text { d[\"text\"] = text }"));
    assert!(message_api.contains("-> [Message] {"));

    let org_api = section(full, "public enum OrgAPI {");
    assert!(org_api.contains("public static func myOrgs(_ client: ConvexClientProtocol) async throws -> [OrgWithRole] {"));
    assert!(org_api.contains("func invite(_ client: ConvexClientProtocol, email: String, isAdmin: Bool, orgId: String)"));
    assert!(!org_api.contains("func acceptInvite("));

    let file_api = section(full, "public enum FileAPI {");
    assert!(file_api.contains("public static func upload(_ client: ConvexClientProtocol) async throws -> String {"));

    let movie_api = section(full, "public enum MovieAPI {");
    assert!(movie_api.contains("try await client.action(\"movie:load\", args: [\"tmdb_id\": Double(tmdbId)])"));

    assert!(!full.contains("AuthAPI"));
    assert!(!full.contains("shouldNotAppear"));
    assert!(!full.contains("HelpersAPI"));
}

#[test]
fn test_reduced_client() {
    let fixture = Fixture::new();
    let reduced = generate(&fixture.options()).unwrap().reduced.unwrap();

    assert!(reduced.contains("extension BlogAPI {\n    public static func create(\n        title: String,\n"));
    assert!(reduced.contains("try await ConvexService.shared.mutate(\"blog:create\", args: args)"));
    assert!(reduced.contains("return Array(try await ConvexService.shared.actionMovies(name: \"movie:search\", args: [\"query\": query]))"));
    assert!(reduced.contains("public static func getOrCreate() async throws {"));
    assert!(!reduced.contains("func myOrgs("));
    assert!(reduced.contains("@preconcurrency\n    public static func subscribeList("));
    assert!(!reduced.contains("ConvexClientProtocol"));
}

#[test]
fn test_run_writes_both_files_and_reports() {
    let fixture = Fixture::new();
    let options = fixture.options();
    let summary = run(&options).unwrap();

    let full = read(&options.output);
    let reduced = read(options.mobile_output.as_ref().unwrap());
    assert!(full.starts_with("// Auto-generated by lazyconvex-codegen-swift. DO NOT EDIT.\n"));
    assert!(reduced.starts_with("// Auto-generated by lazyconvex-codegen-swift. DO NOT EDIT.\n"));

    let mut lines = summary.lines();
    assert_eq!(lines.next(), Some(format!("Generated {}", options.output.display()).as_str()));
    let counts = lines.next().unwrap();
    assert!(counts.starts_with("  "));
    assert!(counts.contains(" modules, "));
    assert!(counts.ends_with(" Where structs"));
    assert!(summary.ends_with("MobileApi.swift\n"));
}

#[test]
fn test_output_is_deterministic() {
    let fixture = Fixture::new();
    let first = generate(&fixture.options()).unwrap();
    let second = generate(&fixture.options()).unwrap();
    assert_eq!(first.full, second.full);
    assert_eq!(first.reduced, second.reduced);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_unsupported_validator_aborts_without_output() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("schema.json"),
        r#"{"owned": {"blog": {"type": "object", "shape": {"at": {"type": "date"}}}}}"#,
    )
    .unwrap();
    let options = fixture.options();

    let err = run(&options).unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::UnsupportedValidator { ref kind, ref field, .. } if kind == "date" && field == "at"
    ));
    assert!(!options.output.exists());
}

#[test]
fn test_missing_inputs_are_usage_errors() {
    let fixture = Fixture::new();
    let mut options = fixture.options();
    options.custom = Some(fixture.path("missing.json"));
    assert!(matches!(generate(&options), Err(GeneratorError::Usage(_))));

    let mut options = fixture.options();
    options.convex = fixture.path("nowhere");
    assert!(matches!(generate(&options), Err(GeneratorError::Usage(_))));
}

/// Text of the declaration opening with `header`, up to its closing brace
fn section<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text.find(header).unwrap_or_else(|| panic!("missing {header}"));
    let rest = &text[start..];
    let end = rest.find("\n}\n").map(|i| i + 3).unwrap_or(rest.len());
    &rest[..end]
}
