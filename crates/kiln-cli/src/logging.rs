//! Console logging
//!
//! Messages go to stderr without timestamps or targets. Informational
//! messages start with a capital letter; warnings and errors carry a
//! `Warning:`, `Error:` or `Fatal error:` prefix followed by the message in
//! lower case.

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Variable holding a filter directive, e.g. `KILN_LOG=kiln_build=debug`
pub const KILN_LOG: &str = "KILN_LOG";

/// How much the command line asked to see
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    #[default]
    Normal,
    /// Include debug messages
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Verbosity::Verbose,
            (false, true) => Verbosity::Quiet,
            (false, false) => Verbosity::Normal,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Event format applying the console prefix and casing rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;
        writeln!(writer, "{}", console_message(*event.metadata().level(), &message))
    }
}

/// Render one message the way the console shows it
pub fn console_message(level: Level, message: &str) -> String {
    let prefix = match level {
        Level::WARN => "Warning",
        Level::ERROR => "Error",
        _ => return with_first(message, char::to_uppercase),
    };
    format!("{}: {}", prefix, with_first(message, char::to_lowercase))
}

/// Fatal error line for an error that ends the process
pub fn fatal_message(message: &str) -> String {
    format!("Fatal error: {}", with_first(message, char::to_lowercase))
}

fn with_first<F, I>(message: &str, convert: F) -> String
where
    F: FnOnce(char) -> I,
    I: Iterator<Item = char>,
{
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => {
            let mut result: String = convert(first).collect();
            result.push_str(chars.as_str());
            result
        }
        None => String::new(),
    }
}

/// Filter from `KILN_LOG`, unless a flag asked for a specific level
pub fn filter(verbosity: Verbosity) -> EnvFilter {
    if verbosity == Verbosity::Normal {
        if let Ok(filter) = EnvFilter::try_from_env(KILN_LOG) {
            return filter;
        }
    }
    EnvFilter::new(verbosity.directive())
}

/// Install the console subscriber for the process
pub fn init(verbosity: Verbosity) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .event_format(ConsoleFormat)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serial_test::serial;

    #[rstest]
    #[case(Level::INFO, "reuse dependency fp16 from deps/fp16", "Reuse dependency fp16 from deps/fp16")]
    #[case(Level::DEBUG, "parsed manifest for fp16", "Parsed manifest for fp16")]
    #[case(Level::WARN, "Certificate for github.com is invalid", "Warning: certificate for github.com is invalid")]
    #[case(Level::ERROR, "No source provided for dependency fp16", "Error: no source provided for dependency fp16")]
    #[case(Level::INFO, "", "")]
    fn test_console_message(#[case] level: Level, #[case] message: &str, #[case] expected: &str) {
        assert_eq!(console_message(level, message), expected);
    }

    #[test]
    fn test_fatal_message() {
        assert_eq!(
            fatal_message("Project manifest does not list dependency fp16"),
            "Fatal error: project manifest does not list dependency fp16"
        );
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    #[serial]
    fn test_flags_override_environment() {
        std::env::set_var(KILN_LOG, "error");
        assert_eq!(filter(Verbosity::Verbose).to_string(), "debug");
        assert_eq!(filter(Verbosity::Normal).to_string(), "error");
        std::env::remove_var(KILN_LOG);
        assert_eq!(filter(Verbosity::Normal).to_string(), "info");
    }
}
