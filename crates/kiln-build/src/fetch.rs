//! Fetching dependency sources
//!
//! Dependencies with a URL are cloned with the `git` executable. Hosts whose
//! certificate cannot be validated are reported once and cloned again
//! without certificate verification.

use crate::error::{BuildError, BuildResult};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Source of dependency checkouts
pub trait Fetcher {
    /// Clone `url` into `dir`, checking out `reference` (branch or tag) if given
    fn clone_repository(&self, url: &str, dir: &Path, reference: Option<&str>) -> BuildResult<()>;
}

/// [`Fetcher`] backed by the `git` command line client
#[derive(Debug)]
pub struct GitFetcher {
    program: String,
    warned_hosts: RefCell<HashSet<String>>,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl GitFetcher {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            warned_hosts: RefCell::new(HashSet::new()),
        }
    }

    /// `git clone` invocation; messages stay untranslated so certificate
    /// errors can be recognized
    fn clone_command(&self, url: &str, dir: &Path, reference: Option<&str>, verify: bool) -> Command {
        let mut command = Command::new(&self.program);
        command.env("LC_ALL", "C");
        if !verify {
            command.args(["-c", "http.sslVerify=false"]);
        }
        command.args(["clone", "--quiet"]);
        if let Some(reference) = reference {
            command.args(["--branch", reference]);
        }
        command.arg(url).arg(dir);
        command
    }

    fn run_clone(
        &self,
        url: &str,
        dir: &Path,
        reference: Option<&str>,
        verify: bool,
    ) -> BuildResult<Result<(), String>> {
        let mut command = self.clone_command(url, dir, reference, verify);
        debug!("running {:?}", command);

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| BuildError::FetchFailed {
                url: url.to_string(),
                dir: dir.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if output.status.success() {
            Ok(Ok(()))
        } else {
            Ok(Err(String::from_utf8_lossy(&output.stderr).trim().to_string()))
        }
    }

    /// Log the certificate problem for `host` unless it was already reported
    fn warn_certificate(&self, host: &str) {
        if self.warned_hosts.borrow_mut().insert(host.to_string()) {
            warn!("could not validate certificate for {}", host);
        }
    }
}

impl Fetcher for GitFetcher {
    fn clone_repository(&self, url: &str, dir: &Path, reference: Option<&str>) -> BuildResult<()> {
        let stderr = match self.run_clone(url, dir, reference, true)? {
            Ok(()) => return Ok(()),
            Err(stderr) => stderr,
        };

        if !is_certificate_error(&stderr) {
            return Err(BuildError::FetchFailed {
                url: url.to_string(),
                dir: dir.to_path_buf(),
                reason: stderr,
            });
        }

        self.warn_certificate(url_host(url).unwrap_or(url));
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        }
        self.run_clone(url, dir, reference, false)?
            .map_err(|reason| BuildError::FetchFailed {
                url: url.to_string(),
                dir: dir.to_path_buf(),
                reason,
            })
    }
}

/// Whether git's error output reports a certificate validation failure
pub fn is_certificate_error(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("ssl certificate problem")
        || stderr.contains("certificate verification failed")
        || stderr.contains("unable to get local issuer certificate")
}

/// Host part of a URL such as `https://user@github.com/google/benchmark.git`
pub fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split('/').next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}
