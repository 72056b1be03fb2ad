//! Low-level Linux syscall wrappers for Landlock self-sandboxing.
//!
//! This crate is the thin kernel-facing layer: raw syscall numbers, the
//! `#[repr(C)]` attribute structs the kernel expects, and one function per
//! Landlock primitive. Policy (which access rights a given ABI supports,
//! strict vs best-effort filtering, rule staging) lives in the `selflock`
//! crate; nothing here interprets flags beyond passing them through.
//!
//! ## Modules
//!
//! - **landlock** - `landlock_create_ruleset`, `landlock_add_rule`,
//!   `landlock_restrict_self`, plus the ABI version and errata queries
//! - **prctl** - `PR_SET_NO_NEW_PRIVS`, required before restricting self
//!
//! # Safety
//!
//! This crate contains raw syscall wrappers. Casts between integer types
//! are unavoidable when interfacing with the kernel ABI.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod landlock;
pub mod prctl;

#[inline]
pub fn last_errno() -> rustix::io::Errno {
    // SAFETY: __errno_location always returns valid thread-local pointer.
    rustix::io::Errno::from_raw_os_error(unsafe { *libc::__errno_location() })
}
