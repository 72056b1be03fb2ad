//! selflock: restrict the calling process with the Landlock LSM.
//!
//! A process builds a declarative ruleset - readable paths, writable
//! paths, TCP ports, IPC scope exceptions - and applies it to itself
//! before running untrusted or semi-trusted code. Application is
//! kernel-enforced and irreversible.
//!
//! ## Quick Start
//!
//! ```ignore
//! use selflock::Ruleset;
//!
//! Ruleset::new()?
//!     .allow_read(["/usr", "/etc"])?
//!     .allow_read_write(["/tmp/scratch"])?
//!     .allow_connect([443])?
//!     .apply()?;
//! ```
//!
//! ## Kernel support
//!
//! The available rights depend on the kernel's Landlock ABI version,
//! detected once per process:
//!
//! | ABI | Kernel | Features |
//! |-----|--------|----------|
//! | 1 | 5.13 | Basic filesystem access |
//! | 2 | 5.19 | Cross-directory rename/link |
//! | 3 | 6.2 | Truncation |
//! | 4 | 6.7 | TCP bind/connect control |
//! | 5 | 6.10 | Device ioctls |
//! | 6 | 6.12 | Signal and abstract-socket scoping |
//!
//! In strict mode (default) requesting a right the kernel cannot enforce
//! is a hard error, so a sandbox is never silently weaker than asked
//! for. [`Ruleset::best_effort`] trades that guarantee for forward
//! compatibility: unsupported rights are filtered out and the rest is
//! enforced.
//!
//! ## Requirements
//!
//! - Linux kernel 5.13+ with `CONFIG_SECURITY_LANDLOCK=y`
//! - No privileges: Landlock is designed for unprivileged processes

pub mod abi;
pub mod error;
pub mod flags;
pub mod ruleset;

pub use abi::{
    AbiInfo, MAX_KNOWN_ABI, fs_access_for_abi, kernel_abi, net_access_for_abi, scope_for_abi,
    supported_access,
};
pub use error::Error;
pub use flags::{Access, AccessFs, AccessNet, Scope};
pub use ruleset::Ruleset;

pub use enumflags2::{BitFlags, make_bitflags};
