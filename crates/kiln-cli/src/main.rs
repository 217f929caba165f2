use clap::{Parser, Subcommand};
use kiln_cli::commands;
use kiln_cli::logging::{self, Verbosity};
use std::process::ExitCode;

/// Kiln: cross-platform C/C++ build configuration
///
/// Kiln generates ninja build files from a project's configure program.
/// This command manages the project's dependencies and describes the
/// platforms a project can be configured for.
///
/// EXAMPLES:
///     kiln setup                          Fetch or link all dependencies
///     kiln setup --with-fp16=../FP16      Use a local checkout of fp16
///     kiln targets                        List targets for this host
///     kiln platform wasm --json           Describe a platform as JSON
///
/// ENVIRONMENT VARIABLES:
///     KILN_LOG          Log filter (e.g. debug, kiln_build=debug)
///     KILN_TARGET       Default target platform
///     KILN_TOOLCHAIN    Default toolchain (auto, gnu, clang)
///     KILN_JSON         Set to '1' for JSON output by default
///     NACL_SDK_ROOT, EMSCRIPTEN, ANDROID_NDK, ANDROID_SDK
///                       SDK locations for cross-compilation
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug messages
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    /// Show warnings and errors only
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up dependencies
    ///
    /// Every dependency listed in kiln.toml, and recursively every dependency
    /// of those, is made available under deps/: an existing directory is
    /// reused, an override is symlinked, a URL is cloned, or a built-in
    /// recipe provides the sources.
    ///
    /// EXAMPLES:
    ///     kiln setup
    ///     kiln setup --with-googletest=~/src/googletest
    ///     kiln setup --with-fp16 ../FP16 --with-psimd ../psimd
    Setup {
        /// Dependency overrides: --with-<name>=<path> or --with-<name> <path>
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OVERRIDES")]
        args: Vec<String>,
    },

    /// List the platforms this host can configure for
    Targets {
        /// Output in JSON format
        #[arg(long, env = "KILN_JSON")]
        json: bool,
    },

    /// Describe a platform given by name or alias
    ///
    /// EXAMPLES:
    ///     kiln platform pnacl
    ///     kiln platform arm64-android --json
    Platform {
        /// Platform name or alias (e.g. x86_64-linux, wasm, pnacl)
        name: String,
        /// Output in JSON format
        #[arg(long, env = "KILN_JSON")]
        json: bool,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Setup { args } => {
            let args = commands::setup::SetupArgs {
                start_dir: std::env::current_dir()?,
                overrides: commands::setup::parse_overrides(&args)?,
            };
            commands::setup::run(args)
        }
        Commands::Targets { json } => commands::targets::run(json),
        Commands::Platform { name, json } => commands::platform::run(&name, json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(Verbosity::from_flags(cli.verbose, cli.quiet)) {
        eprintln!("{}", logging::fatal_message(&e.to_string()));
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", logging::fatal_message(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}
