//! lazyconvex-codegen
//!
//! Generates typed Swift client bindings from a lazyconvex schema document and
//! the Convex function modules that serve it.
//!
//! The pipeline runs in fixed stages:
//!
//! 1. [`schema`] loads the validator maps and [`harvest`] resolves every table
//!    through [`resolve`], collecting synthesized types in a [`registry`].
//! 2. [`scan`] reads module sources for exported names and factory calls.
//! 3. [`filter`] derives `Where` records; [`overlay`] supplies custom
//!    function descriptors.
//! 4. [`output`] renders the full and reduced clients through [`swift`] and
//!    writes them only after every stage has succeeded.

pub mod error;
pub mod filter;
pub mod harvest;
pub mod ir;
pub mod output;
pub mod overlay;
pub mod registry;
pub mod resolve;
pub mod scan;
pub mod schema;
pub mod swift;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use error::GeneratorError;
pub use output::Stats;

use overlay::CustomConfig;
use schema::SchemaModule;

/// Inputs and destinations of one generator run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Schema document (JSON validator maps)
    pub schema: PathBuf,

    /// Convex function-module directory
    pub convex: PathBuf,

    /// Full client destination
    pub output: PathBuf,

    /// Reduced client destination
    pub mobile_output: Option<PathBuf>,

    /// Overlay config
    pub custom: Option<PathBuf>,
}

/// Rendered client files, not yet written
#[derive(Debug, Clone)]
pub struct Generated {
    pub full: String,
    pub reduced: Option<String>,
    pub stats: Stats,
}

fn require(path: &Path, is_dir: bool, what: &str) -> Result<(), GeneratorError> {
    let found = if is_dir { path.is_dir() } else { path.is_file() };
    if found {
        Ok(())
    } else {
        Err(GeneratorError::Usage(format!("{what} not found: {}", path.display())))
    }
}

/// Run every stage and render both clients in memory
pub fn generate(options: &GenerateOptions) -> Result<Generated, GeneratorError> {
    require(&options.schema, false, "schema file")?;
    require(&options.convex, true, "convex directory")?;
    if let Some(custom) = &options.custom {
        require(custom, false, "custom config")?;
    }

    let schema = SchemaModule::load(&options.schema)?;
    let model = harvest::harvest(&schema)?;
    debug!(
        tables = model.tables.len(),
        enums = model.registry.enums().len(),
        records = model.registry.records().len(),
        "harvested schema"
    );

    let sources = scan::read_sources(&options.convex, scan::is_module_file)?;
    let modules = scan::build_modules(&sources, &model);
    let wheres = filter::derive(&model);
    let config = match &options.custom {
        Some(path) => CustomConfig::load(path)?,
        None => CustomConfig::default(),
    };

    let inputs = output::Inputs {
        model: &model,
        modules: &modules,
        wheres: &wheres,
        config: &config,
    };
    let (full, stats) = output::render_full(&inputs);
    let reduced = options
        .mobile_output
        .is_some()
        .then(|| output::render_reduced(&inputs));

    Ok(Generated {
        full,
        reduced,
        stats,
    })
}

/// Generate, write both files and return the summary
pub fn run(options: &GenerateOptions) -> Result<String, GeneratorError> {
    let generated = generate(options)?;

    output::write_atomic(&options.output, &generated.full)?;
    let mut summary = format!("Generated {}\n  {}\n", options.output.display(), generated.stats);

    if let (Some(path), Some(reduced)) = (&options.mobile_output, &generated.reduced) {
        output::write_atomic(path, reduced)?;
        summary.push_str(&format!("Generated {}\n", path.display()));
    }

    Ok(summary)
}
