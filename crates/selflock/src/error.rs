//! Error taxonomy for ruleset construction and application.
//!
//! Every failure is reported synchronously at the call that triggered it;
//! nothing is retried or logged internally. The only deliberate silence is
//! best-effort filtering: a rule whose requested rights are entirely
//! unsupported at the detected ABI is dropped, not stored and not reported.

use std::path::PathBuf;

use rustix::io::Errno;
use thiserror::Error;

/// Errors surfaced while building or applying a ruleset.
#[derive(Debug, Error)]
pub enum Error {
    /// Landlock is absent: kernel too old, unsupported architecture, or
    /// disabled at boot. Fatal and not retryable.
    #[error("landlock is not available on this kernel: {0}")]
    Unavailable(#[source] Errno),

    /// A rule path did not exist when staged.
    #[error("path does not exist: {}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict mode refused access rights the detected ABI cannot enforce.
    /// Never produced in best-effort mode.
    #[error("access rights not supported at landlock ABI {abi}: {unsupported}")]
    Compatibility { unsupported: String, abi: u32 },

    /// A network rule requested neither bind nor connect.
    #[error("network rule must request at least one of bind or connect")]
    EmptyNetAccess,

    /// The ruleset was already applied; staging and apply are one-shot.
    #[error("ruleset already applied to this process")]
    AlreadyApplied,

    /// The kernel rejected a ruleset operation mid-apply. The process may
    /// already have `NO_NEW_PRIVS` set with no ruleset installed; treat as
    /// fatal rather than continuing unsandboxed.
    #[error("landlock {op} failed: {source}")]
    Ruleset {
        op: &'static str,
        #[source]
        source: Errno,
    },
}
