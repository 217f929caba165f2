//! Name validation
//!
//! Names that end up in file paths, compiler flags or ninja identifiers are
//! checked here before they reach the build graph.

use crate::manifest::Project;
use regex::Regex;
use std::sync::OnceLock;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid package name {0}: an identifier expected")]
    InvalidPackageName(String),

    #[error("Invalid module name {0}: an identifier expected")]
    InvalidModuleName(String),

    #[error("Invalid name {0}: names starting with an underscore are reserved")]
    ReservedName(String),

    #[error("Invalid {kind} {name}: a valid C identifier expected")]
    InvalidIdentifier { kind: &'static str, name: String },

    #[error("Invalid system dependency {0}: name of a system library expected")]
    InvalidSystemLibrary(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[_a-zA-Z]\w*$").expect("valid identifier regex"))
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+$").expect("valid word regex"))
}

fn system_library_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w*+,.-]+$").expect("valid library regex"))
}

/// Project manifest validator
pub struct Validator;

impl Validator {
    /// Validate a parsed project manifest
    pub fn validate(project: &Project) -> Result<(), ValidationError> {
        if project.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if project.license.trim().is_empty() {
            return Err(ValidationError::MissingField("license"));
        }
        for dep in &project.deps {
            Self::validate_package_name(&dep.name)?;
        }
        Ok(())
    }

    /// Validate a dependency name; returns the lowercased name
    pub fn validate_package_name(name: &str) -> Result<String, ValidationError> {
        if !identifier_regex().is_match(name) {
            return Err(ValidationError::InvalidPackageName(name.to_string()));
        }
        if name.starts_with('_') {
            return Err(ValidationError::ReservedName(name.to_string()));
        }
        Ok(name.to_lowercase())
    }

    /// Validate a module name; returns the lowercased name
    pub fn validate_module_name(name: &str) -> Result<String, ValidationError> {
        if !identifier_regex().is_match(name) {
            return Err(ValidationError::InvalidModuleName(name.to_string()));
        }
        if name.starts_with('_') {
            return Err(ValidationError::ReservedName(name.to_string()));
        }
        Ok(name.to_lowercase())
    }

    /// Validate a preprocessor macro name
    pub fn validate_macro_name(name: &str) -> Result<(), ValidationError> {
        if identifier_regex().is_match(name) {
            Ok(())
        } else {
            Err(ValidationError::InvalidIdentifier {
                kind: "macro name",
                name: name.to_string(),
            })
        }
    }

    /// Validate the name of a function exported from a JavaScript module
    pub fn validate_export_function(name: &str) -> Result<(), ValidationError> {
        if word_regex().is_match(name) {
            Ok(())
        } else {
            Err(ValidationError::InvalidIdentifier {
                kind: "function name",
                name: name.to_string(),
            })
        }
    }

    /// Validate the name of a system library passed to the linker as `-l<name>`
    pub fn validate_system_library(name: &str) -> Result<(), ValidationError> {
        if system_library_regex().is_match(name) {
            Ok(())
        } else {
            Err(ValidationError::InvalidSystemLibrary(name.to_string()))
        }
    }
}
