//! Process control wrappers.

use rustix::io::Errno;

use crate::last_errno;

/// Set `PR_SET_NO_NEW_PRIVS` - required before `landlock_restrict_self`.
///
/// Idempotent: the bit is already-set-safe and can never be cleared again.
///
/// # Errors
///
/// Returns `Errno` if the prctl fails.
pub fn set_no_new_privs() -> Result<(), Errno> {
    // SAFETY: PR_SET_NO_NEW_PRIVS takes integer arguments only.
    let ret = unsafe { libc::prctl(libc::PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) };
    if ret != 0 { Err(last_errno()) } else { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_new_privs_is_idempotent() {
        // Harmless for the test process; repeat calls are no-ops.
        assert!(set_no_new_privs().is_ok());
        assert!(set_no_new_privs().is_ok());
    }
}
