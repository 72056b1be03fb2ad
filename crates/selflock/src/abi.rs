//! Kernel ABI detection and the capability catalog.
//!
//! Detection queries the kernel exactly once per process; the result is
//! cached in a `OnceLock` and every later call converges on the same
//! value, so concurrent first calls are safe to race. The catalog maps a
//! detected ABI version to the access rights enforceable at that version:
//!
//! | ABI | New rights |
//! |-----|------------|
//! | 1 | base filesystem set |
//! | 2 | `Refer` |
//! | 3 | `Truncate` |
//! | 4 | `BindTcp`, `ConnectTcp` |
//! | 5 | `IoctlDev` |
//! | 6 | `AbstractUnixSocket`, `Signal` |

use std::sync::OnceLock;

use enumflags2::BitFlags;
use rustix::io::Errno;
use selflock_sys::landlock;

use crate::error::Error;
use crate::flags::{Access, AccessFs, AccessNet, Scope};

/// Highest ABI version this crate knows rights for. Newer kernels report
/// higher versions; they supply at least these rights.
pub const MAX_KNOWN_ABI: u32 = 6;

/// Kernel-reported Landlock capability, detected once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiInfo {
    /// ABI version, >= 1 whenever Landlock is present.
    pub version: u32,
    /// Erratum bits for this ABI. Informational only; zero on kernels
    /// that predate the errata query.
    pub errata: u32,
}

static KERNEL_ABI: OnceLock<Result<AbiInfo, Errno>> = OnceLock::new();

/// The Landlock ABI reported by the running kernel.
///
/// The kernel is queried on first use; repeated calls return the cached
/// result without side effects.
///
/// # Errors
///
/// Returns [`Error::Unavailable`] when the kernel lacks Landlock
/// entirely (too old, unsupported architecture, or disabled at boot).
pub fn kernel_abi() -> Result<AbiInfo, Error> {
    let probed = *KERNEL_ABI.get_or_init(probe_kernel);
    probed.map_err(Error::Unavailable)
}

fn probe_kernel() -> Result<AbiInfo, Errno> {
    let version = landlock::landlock_abi_version()?;
    // Kernels that predate the errata query reject the flag; not an error.
    let errata = landlock::landlock_abi_errata().unwrap_or(0);
    Ok(AbiInfo { version, errata })
}

/// Every right in `T`'s category enforceable at ABI `abi`.
///
/// Monotonic in `abi`: raising the version never removes rights. Returns
/// the empty set for versions below the category's introduction (network
/// below 4, scope below 6).
pub fn supported_access<T: Access>(abi: u32) -> BitFlags<T> {
    BitFlags::<T>::all()
        .iter()
        .filter(|f| f.since_abi() <= abi)
        .collect()
}

/// Filesystem rights enforceable at `abi`.
pub fn fs_access_for_abi(abi: u32) -> BitFlags<AccessFs> {
    supported_access(abi)
}

/// Network rights enforceable at `abi`. Empty below ABI 4.
pub fn net_access_for_abi(abi: u32) -> BitFlags<AccessNet> {
    supported_access(abi)
}

/// Restrictable scopes at `abi`. Empty below ABI 6.
pub fn scope_for_abi(abi: u32) -> BitFlags<Scope> {
    supported_access(abi)
}
