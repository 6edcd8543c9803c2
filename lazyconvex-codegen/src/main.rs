//! lazyconvex-codegen: Generate typed Swift clients for a lazyconvex backend
//!
//! Usage:
//!   lazyconvex-codegen --schema schema.json --convex ./convex --output Api.swift
//!   lazyconvex-codegen ... --mobile-output MobileApi.swift --custom custom.json

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lazyconvex_codegen::{GenerateOptions, run};

#[derive(Parser, Debug)]
#[command(name = "lazyconvex-codegen")]
#[command(about = "Generate typed Swift client bindings from a lazyconvex schema")]
struct Args {
    /// Schema document holding the validator maps
    #[arg(long)]
    schema: PathBuf,

    /// Convex function-module directory
    #[arg(long)]
    convex: PathBuf,

    /// Full client output file
    #[arg(long)]
    output: PathBuf,

    /// Reduced (mobile) client output file
    #[arg(long = "mobile-output")]
    mobile_output: Option<PathBuf>,

    /// JSON overlay with extra function descriptors and subscriptions
    #[arg(long)]
    custom: Option<PathBuf>,

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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = GenerateOptions {
        schema: args.schema,
        convex: args.convex,
        output: args.output,
        mobile_output: args.mobile_output,
        custom: args.custom,
    };

    let summary = run(&options)?;
    print!("{summary}");

    Ok(())
}
