//! Kiln command-line support
//!
//! The `kiln` binary is built from this crate, and configure programs use it
//! for their argument parsing and console logging:
//!
//! ```no_run
//! use clap::Parser;
//! use kiln_cli::{logging, StandardArgs};
//!
//! #[derive(Parser)]
//! struct Configure {
//!     #[command(flatten)]
//!     standard: StandardArgs,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let cli = Configure::parse();
//! logging::init(logging::Verbosity::Normal)?;
//! let (context, args) = cli.standard.prepare()?;
//! let build = kiln_build::Build::from_args(&args, &context, None)?;
//! build.generate()?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod commands;
pub mod logging;

pub use args::StandardArgs;
pub use logging::Verbosity;
