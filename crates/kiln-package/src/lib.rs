//! Kiln Package Manifests
//!
//! Parsing of the `kiln.toml` project manifest and validation of the names
//! that flow from it into the build graph (packages, modules, identifiers,
//! system libraries).

pub mod manifest;
pub mod validator;

pub use manifest::{Dependency, Project, MANIFEST_FILE_NAME};
pub use validator::{ValidationError, Validator};

use std::path::PathBuf;

/// Package management errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Failed to parse manifest {path}: {error}")]
    ParseError {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Failed to read project manifest {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to write project manifest {path}: {error}")]
    WriteError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to serialize manifest {path}: {error}")]
    SerializeError {
        path: PathBuf,
        error: toml::ser::Error,
    },

    #[error("Invalid project manifest {path}: {error}")]
    Invalid {
        path: PathBuf,
        error: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, PackageError>;
