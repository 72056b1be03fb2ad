//! Typed access rights for the three restriction categories.
//!
//! Each enum mirrors the kernel uapi bits exported by `selflock-sys`, so a
//! `BitFlags` set converts to the wire representation with `.bits()`. The
//! [`Access`] trait records the ABI version that introduced each right;
//! the catalog in [`crate::abi`] is a generic filter over it.

use enumflags2::{BitFlags, bitflags};
use selflock_sys::landlock as uapi;

/// An access right gated by the kernel's Landlock ABI version.
pub trait Access: enumflags2::BitFlag + std::fmt::Debug {
    /// ABI version that introduced this right.
    fn since_abi(self) -> u32;
}

/// Filesystem access rights.
#[bitflags]
#[repr(u64)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessFs {
    /// Execute a file.
    Execute = uapi::LANDLOCK_ACCESS_FS_EXECUTE,
    /// Open a file with write access.
    WriteFile = uapi::LANDLOCK_ACCESS_FS_WRITE_FILE,
    /// Open a file with read access.
    ReadFile = uapi::LANDLOCK_ACCESS_FS_READ_FILE,
    /// List directory content.
    ReadDir = uapi::LANDLOCK_ACCESS_FS_READ_DIR,
    /// Remove an empty directory or rename one.
    RemoveDir = uapi::LANDLOCK_ACCESS_FS_REMOVE_DIR,
    /// Unlink or rename a file.
    RemoveFile = uapi::LANDLOCK_ACCESS_FS_REMOVE_FILE,
    /// Create, rename, or link a character device.
    MakeChar = uapi::LANDLOCK_ACCESS_FS_MAKE_CHAR,
    /// Create or rename a directory.
    MakeDir = uapi::LANDLOCK_ACCESS_FS_MAKE_DIR,
    /// Create, rename, or link a regular file.
    MakeReg = uapi::LANDLOCK_ACCESS_FS_MAKE_REG,
    /// Create, rename, or link a unix socket.
    MakeSock = uapi::LANDLOCK_ACCESS_FS_MAKE_SOCK,
    /// Create, rename, or link a named pipe.
    MakeFifo = uapi::LANDLOCK_ACCESS_FS_MAKE_FIFO,
    /// Create, rename, or link a block device.
    MakeBlock = uapi::LANDLOCK_ACCESS_FS_MAKE_BLOCK,
    /// Create, rename, or link a symlink.
    MakeSym = uapi::LANDLOCK_ACCESS_FS_MAKE_SYM,
    /// Link or rename across directories (ABI 2+).
    Refer = uapi::LANDLOCK_ACCESS_FS_REFER,
    /// Truncate a file (ABI 3+).
    Truncate = uapi::LANDLOCK_ACCESS_FS_TRUNCATE,
    /// Invoke ioctl on a device file (ABI 5+).
    IoctlDev = uapi::LANDLOCK_ACCESS_FS_IOCTL_DEV,
}

/// Network access rights (ABI 4+).
#[bitflags]
#[repr(u64)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessNet {
    /// Bind a TCP socket to a local port.
    BindTcp = uapi::LANDLOCK_ACCESS_NET_BIND_TCP,
    /// Connect a TCP socket to a remote port.
    ConnectTcp = uapi::LANDLOCK_ACCESS_NET_CONNECT_TCP,
}

/// IPC scopes restrictable from ABI 6. Unlike filesystem and network
/// rights these are restricted by default once supported; explicit
/// allowances carve out exceptions.
#[bitflags]
#[repr(u64)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Connecting to abstract unix sockets created outside the sandbox.
    AbstractUnixSocket = uapi::LANDLOCK_SCOPE_ABSTRACT_UNIX_SOCKET,
    /// Sending signals to processes outside the sandbox.
    Signal = uapi::LANDLOCK_SCOPE_SIGNAL,
}

impl Access for AccessFs {
    fn since_abi(self) -> u32 {
        match self {
            Self::Refer => 2,
            Self::Truncate => 3,
            Self::IoctlDev => 5,
            _ => 1,
        }
    }
}

impl Access for AccessNet {
    fn since_abi(self) -> u32 {
        4
    }
}

impl Access for Scope {
    fn since_abi(self) -> u32 {
        6
    }
}

/// Names of the set flags, for error messages.
pub(crate) fn flag_names<T: Access>(flags: BitFlags<T>) -> String {
    let names: Vec<String> = flags.iter().map(|f| format!("{f:?}")).collect();
    names.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_bits_match_uapi() {
        assert_eq!(AccessFs::Execute as u64, uapi::LANDLOCK_ACCESS_FS_EXECUTE);
        assert_eq!(AccessFs::Refer as u64, uapi::LANDLOCK_ACCESS_FS_REFER);
        assert_eq!(
            AccessFs::IoctlDev as u64,
            uapi::LANDLOCK_ACCESS_FS_IOCTL_DEV
        );
        assert_eq!(
            AccessNet::ConnectTcp as u64,
            uapi::LANDLOCK_ACCESS_NET_CONNECT_TCP
        );
        assert_eq!(Scope::Signal as u64, uapi::LANDLOCK_SCOPE_SIGNAL);
    }

    #[test]
    fn introduction_versions() {
        assert_eq!(AccessFs::ReadFile.since_abi(), 1);
        assert_eq!(AccessFs::Refer.since_abi(), 2);
        assert_eq!(AccessFs::Truncate.since_abi(), 3);
        assert_eq!(AccessFs::IoctlDev.since_abi(), 5);
        assert_eq!(AccessNet::BindTcp.since_abi(), 4);
        assert_eq!(Scope::AbstractUnixSocket.since_abi(), 6);
    }

    #[test]
    fn flag_names_joined() {
        let names = flag_names(AccessFs::ReadFile | AccessFs::Refer);
        assert!(names.contains("ReadFile"));
        assert!(names.contains("Refer"));
    }
}
