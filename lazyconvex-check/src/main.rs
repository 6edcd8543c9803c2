//! lazyconvex-check: Cross-check schema tables against factory calls
//!
//! Run from a project root (or pass the paths explicitly):
//!   lazyconvex-check
//!   lazyconvex-check --convex backend/convex --schema backend/t.ts
//!   lazyconvex-check --endpoints

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lazyconvex_codegen::ir::FactoryCall;
use lazyconvex_codegen::scan::{find_factory_calls, read_sources};

mod discover;
mod error;
mod report;
mod schema_tables;

use discover::SchemaFile;
use error::CheckError;

#[derive(Parser, Debug)]
#[command(name = "lazyconvex-check")]
#[command(about = "Check that every schema table has exactly one matching factory call")]
struct Args {
    /// Convex function directory (discovered from the working directory when omitted)
    #[arg(long)]
    convex: Option<PathBuf>,

    /// Schema module (discovered beside the convex directory when omitted)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// List the endpoints each factory call exposes instead of checking
    #[arg(long)]
    endpoints: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn failure(message: &str, hint: &str) -> ExitCode {
    println!("{}", format!("✗ {message}").red());
    println!("{}", format!("  {hint}").dimmed());
    ExitCode::FAILURE
}

/// Factory calls from every checked module, and the checked file names
fn scan_calls(convex: &std::path::Path) -> Result<(Vec<FactoryCall>, Vec<String>), CheckError> {
    let sources = read_sources(convex, discover::is_checked_file)?;
    let calls = sources
        .iter()
        .flat_map(|source| find_factory_calls(&source.file, &source.text))
        .collect();
    let files = sources.into_iter().map(|source| source.file).collect();
    Ok((calls, files))
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    println!("{}", "\nlazyconvex check\n".bold());

    let convex = match args.convex {
        Some(dir) => dir,
        None => match discover::find_convex_dir(&std::env::current_dir()?) {
            Ok(dir) => dir,
            Err(CheckError::ConvexDirNotFound(_)) => {
                return Ok(failure(
                    "Could not find convex/ directory with _generated/",
                    "Run from project root or a directory containing convex/",
                ));
            }
            Err(e) => return Err(e.into()),
        },
    };
    println!("{} {}", "convex dir:".dimmed(), convex.display());

    let schema = match args.schema {
        Some(path) => {
            let text = fs::read_to_string(&path).map_err(|e| CheckError::io(&path, e))?;
            SchemaFile { path, text }
        }
        None => match discover::find_schema_file(&convex) {
            Ok(schema) => schema,
            Err(CheckError::SchemaNotFound(_)) => {
                return Ok(failure(
                    "Could not find schema file with lazyconvex markers",
                    "Expected a .ts file calling makeOwned/makeOrgScoped/etc.",
                ));
            }
            Err(e) => return Err(e.into()),
        },
    };
    println!("{}    {}\n", "schema:".dimmed(), schema.path.display());

    let (calls, files) = scan_calls(&convex)?;
    debug!(files = files.len(), calls = calls.len(), "scanned convex directory");

    if args.endpoints {
        print!("{}", report::render_endpoints(&calls));
        return Ok(ExitCode::SUCCESS);
    }

    let tables = schema_tables::extract_tables(&schema.text);
    let listed = if tables.is_empty() {
        "none".to_string()
    } else {
        tables.join(", ")
    };
    println!("{} {}", "tables in schema:".dimmed(), listed);
    println!("{}    {}\n", "factory calls:".dimmed(), calls.len());

    let issues = report::check(&tables, &schema.file_name(), &calls, &files);
    print!("{}", report::render_issues(&issues));

    if report::error_count(&issues) > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
