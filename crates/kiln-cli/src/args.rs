//! Standard arguments of configure programs
//!
//! Every configure program accepts `--target` and `--toolchain`. Values not
//! given on the command line come from the `[defaults]` section of the
//! global config (or `KILN_TARGET` / `KILN_TOOLCHAIN`), then from the host.

use anyhow::{Context as _, Result};
use clap::Args;
use kiln_build::{ConfigureArgs, Context, Platform, ToolchainKind};
use kiln_config::{Config, ConfigLoader};
use std::rc::Rc;

/// `--target` and `--toolchain`, flattened into a configure program's parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct StandardArgs {
    /// Platform where the code will run (default: the host; see `kiln targets`)
    #[arg(long, value_name = "PLATFORM", value_parser = parse_platform)]
    pub target: Option<Platform>,

    /// Toolchain to use for compilation: auto (default), gnu, or clang
    #[arg(long, value_name = "TOOLCHAIN", value_parser = parse_toolchain)]
    pub toolchain: Option<ToolchainKind>,
}

pub fn parse_platform(value: &str) -> Result<Platform, String> {
    Platform::new(value).map_err(|e| e.to_string())
}

pub fn parse_toolchain(value: &str) -> Result<ToolchainKind, String> {
    value.parse().map_err(|e: kiln_build::BuildError| e.to_string())
}

impl StandardArgs {
    /// Target and toolchain after applying configured defaults
    pub fn configure_args(&self, config: &Config, host: Platform) -> Result<ConfigureArgs> {
        let target = match (self.target, config.default_target()) {
            (Some(target), _) => target,
            (None, Some(name)) => Platform::new(name).context("invalid default target in global config")?,
            (None, None) => host,
        };
        let toolchain = match (self.toolchain, config.default_toolchain()) {
            (Some(toolchain), _) => toolchain,
            (None, Some(name)) => name
                .parse()
                .context("invalid default toolchain in global config")?,
            (None, None) => ToolchainKind::Auto,
        };
        Ok(ConfigureArgs::new(target, toolchain))
    }

    /// Load the configuration for the current directory and create the
    /// context of a configuration run rooted at the project root
    pub fn prepare(&self) -> Result<(Rc<Context>, ConfigureArgs)> {
        let current_dir = std::env::current_dir().context("failed to read the current directory")?;
        let config = ConfigLoader::new().load_from_directory(&current_dir)?;
        let root_dir = config
            .project_root()
            .map(|root| root.to_path_buf())
            .unwrap_or(current_dir);

        let context = Context::builder(root_dir)
            .with_environment(config.environment.clone())
            .build()?;
        let args = self.configure_args(&config, context.host())?;
        Ok((context, args))
    }
}

/// Targets the host can configure for, host first
pub fn possible_targets(config: &Config, host: Platform) -> Vec<Platform> {
    host.possible_targets(&config.environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kiln_config::global::DefaultsConfig;
    use kiln_config::{Environment, GlobalConfig};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Parser)]
    struct Configure {
        #[command(flatten)]
        standard: StandardArgs,
    }

    fn platform(name: &str) -> Platform {
        Platform::new(name).unwrap()
    }

    fn config(target: Option<&str>, toolchain: Option<&str>) -> Config {
        Config {
            global: GlobalConfig {
                defaults: Some(DefaultsConfig {
                    target: target.map(str::to_string),
                    toolchain: toolchain.map(str::to_string),
                }),
                sdk: None,
            },
            environment: Environment::default(),
            project_root: None,
        }
    }

    #[test]
    fn test_parse_standard_args() {
        let cli = Configure::try_parse_from(["configure", "--target", "pnacl", "--toolchain", "clang"]).unwrap();
        assert_eq!(cli.standard.target, Some(platform("pnacl-nacl-newlib")));
        assert_eq!(cli.standard.toolchain, Some(ToolchainKind::Clang));
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert!(Configure::try_parse_from(["configure", "--target", "vax-vms"]).is_err());
        assert!(Configure::try_parse_from(["configure", "--toolchain", "msvc"]).is_err());
    }

    #[test]
    fn test_host_is_default_target() {
        let host = platform("x86_64-linux-gnu");
        let args = StandardArgs::default()
            .configure_args(&config(None, None), host)
            .unwrap();
        assert_eq!(args, ConfigureArgs::new(host, ToolchainKind::Auto));
    }

    #[test]
    fn test_configured_defaults() {
        let host = platform("x86_64-linux-gnu");
        let args = StandardArgs::default()
            .configure_args(&config(Some("wasm"), Some("clang")), host)
            .unwrap();
        assert_eq!(args.target, platform("wasm32-emscripten"));
        assert_eq!(args.toolchain, ToolchainKind::Clang);
    }

    #[test]
    fn test_flags_override_defaults() {
        let host = platform("x86_64-linux-gnu");
        let standard = StandardArgs {
            target: Some(platform("asmjs")),
            toolchain: Some(ToolchainKind::Auto),
        };
        let args = standard
            .configure_args(&config(Some("wasm"), Some("clang")), host)
            .unwrap();
        assert_eq!(args.target, platform("asmjs-emscripten"));
        assert_eq!(args.toolchain, ToolchainKind::Auto);
    }

    #[test]
    fn test_invalid_configured_default() {
        let host = platform("x86_64-linux-gnu");
        let err = StandardArgs::default()
            .configure_args(&config(Some("vax-vms"), None), host)
            .unwrap_err();
        assert!(err.to_string().contains("default target"));
    }

    #[test]
    fn test_possible_targets_start_with_host() {
        let host = platform("x86_64-linux-gnu");
        let mut config = config(None, None);
        config.environment.emscripten_root = Some("/opt/emsdk".into());
        let targets = possible_targets(&config, host);
        assert_eq!(targets[0], host);
        assert!(targets.contains(&platform("wasm")));
    }
}
