//! Configure program for a small header-plus-library project
//!
//! Run it from a project with a `kiln.toml`, `include/` and `src/`:
//!
//! ```text
//! cargo run --example configure -- --target wasm
//! ninja
//! ```

use anyhow::Result;
use clap::Parser;
use kiln_build::{Build, Options};
use kiln_cli::logging::{self, Verbosity};
use kiln_cli::StandardArgs;

#[derive(Parser)]
#[command(about = "Configure the project and write build.ninja")]
struct Configure {
    #[command(flatten)]
    standard: StandardArgs,
}

fn main() -> Result<()> {
    let cli = Configure::parse();
    logging::init(Verbosity::Normal)?;

    let (context, args) = cli.standard.prepare()?;
    let mut build = Build::from_args(&args, &context, None)?;
    build.export_cpath("include", true)?;
    {
        let mut scope = build.options(Options::new().source_dir("src"))?;
        let object = scope.cc("library.c")?;
        scope.static_library("library", [object])?;
    }
    let path = build.generate()?;
    tracing::info!("wrote {}", path.display());
    Ok(())
}
