/// Build configuration error types
use kiln_package::{PackageError, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Broad classification of a [`BuildError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input at the call that received it
    Validation,
    /// A dependency or manifest could not be resolved
    Resolution,
    /// Missing SDK or unsupported host/target/operation
    Environment,
    /// Conflicting instruction-set flag families
    Incompatibility,
    /// Filesystem or process failure
    Io,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid platform name {0}")]
    InvalidPlatform(String),

    #[error(transparent)]
    InvalidName(#[from] ValidationError),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflicting options: both {replace} and {extend} specified")]
    ConflictingOptions {
        replace: &'static str,
        extend: &'static str,
    },

    #[error("Macro {0} is already defined")]
    MacroRedefined(String),

    #[error("Macro {0} is not defined")]
    MacroUndefined(String),

    #[error("Module {module} does not exist")]
    ModuleNotFound { module: String },

    #[error("Module collection is sealed: module {module} cannot be modified")]
    SealedModule { module: String },

    #[error("Project manifest does not list dependency {name}")]
    UndeclaredDependency { name: String },

    #[error("No source provided for dependency {name} ({qualified_name})")]
    NoSource {
        name: String,
        qualified_name: String,
    },

    #[error("Don't know how to configure dependency {name} ({qualified_name}): no configure script registered for {dir}")]
    NoConfigureScript {
        name: String,
        qualified_name: String,
        dir: PathBuf,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Failed to fetch {url} into {dir}: {reason}")]
    FetchFailed {
        url: String,
        dir: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Manifest(#[from] PackageError),

    #[error("{what} not found: set {variable} or configure it in ~/.kiln/config.toml")]
    SdkNotFound {
        what: &'static str,
        variable: &'static str,
    },

    #[error("Unsupported host platform: {0}")]
    UnsupportedHost(String),

    #[error("Unsupported target platform {target}: {reason}")]
    UnsupportedTarget { target: String, reason: String },

    #[error("{operation} not supported on {target}")]
    Unsupported { operation: String, target: String },

    #[error("Instruction sets {left} and {right} are mutually incompatible")]
    IncompatibleInstructionSets { left: String, right: String },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>, target: impl ToString) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            target: target.to_string(),
        }
    }

    /// Create an unsupported target error
    pub fn unsupported_target(target: impl ToString, reason: impl ToString) -> Self {
        Self::UnsupportedTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing SDK error
    pub fn sdk_not_found(what: &'static str, variable: &'static str) -> Self {
        Self::SdkNotFound { what, variable }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPlatform(_)
            | Self::InvalidName(_)
            | Self::InvalidPath { .. }
            | Self::InvalidArgument(_)
            | Self::ConflictingOptions { .. }
            | Self::MacroRedefined(_)
            | Self::MacroUndefined(_)
            | Self::ModuleNotFound { .. }
            | Self::SealedModule { .. }
            | Self::UndeclaredDependency { .. } => ErrorKind::Validation,
            Self::NoSource { .. }
            | Self::NoConfigureScript { .. }
            | Self::CircularDependency(_)
            | Self::FetchFailed { .. }
            | Self::Manifest(_) => ErrorKind::Resolution,
            Self::SdkNotFound { .. }
            | Self::UnsupportedHost(_)
            | Self::UnsupportedTarget { .. }
            | Self::Unsupported { .. } => ErrorKind::Environment,
            Self::IncompatibleInstructionSets { .. } => ErrorKind::Incompatibility,
            Self::IoError { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuildError::NoSource {
            name: "fp16".to_string(),
            qualified_name: "nnpack:psimd:fp16".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No source provided for dependency fp16 (nnpack:psimd:fp16)"
        );
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BuildError::InvalidPlatform("vax".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BuildError::unsupported("Benchmarks", "asmjs-emscripten").kind(),
            ErrorKind::Environment
        );
        assert_eq!(
            BuildError::sdk_not_found("Native Client SDK", "NACL_SDK_ROOT").kind(),
            ErrorKind::Environment
        );
    }
}
