//! Ruleset construction and one-shot application.
//!
//! A [`Ruleset`] accumulates path rules, TCP port rules, and scope
//! allowances in memory, then installs everything on the calling process
//! in a single irreversible [`apply`](Ruleset::apply). Staging never
//! touches the kernel; only `apply` does.
//!
//! The three categories restrict in different directions:
//!
//! - **Filesystem and network**: opt-in. Only the rights referenced by
//!   staged rules are handled; a category with no staged rules is left
//!   completely unrestricted, and each rule then whitelists its path or
//!   port.
//! - **Scope** (signals, abstract unix sockets): opt-out. Everything the
//!   kernel can restrict is restricted unless explicitly allowed.
//!
//! ## Strict vs best-effort
//!
//! Every staging call intersects the requested rights with what the
//! detected ABI supports. In strict mode (the default) any unsupported
//! remainder is a hard [`Error::Compatibility`], so the sandbox is never
//! silently weaker than requested. In best-effort mode the remainder is
//! filtered out; a rule whose rights are filtered to nothing is dropped
//! entirely rather than staged with no access.
//!
//! ## Example
//!
//! ```ignore
//! use selflock::{AccessFs, Ruleset};
//!
//! Ruleset::new()?
//!     .allow_read(["/usr", "/etc"])?
//!     .allow_read_write(["/tmp/scratch"])?
//!     .allow_connect([443])?
//!     .apply()?;
//! // This process can no longer touch anything else.
//! ```

use std::ffi::CString;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use enumflags2::BitFlags;
use rustix::io::Errno;
use selflock_sys::landlock::{
    LandlockNetPortAttr, LandlockPathBeneathAttr, LandlockRulesetAttr, landlock_add_rule_net,
    landlock_add_rule_path, landlock_create_ruleset, landlock_restrict_self,
};
use selflock_sys::{last_errno, prctl::set_no_new_privs};

use crate::abi::{kernel_abi, supported_access};
use crate::error::Error;
use crate::flags::{Access, AccessFs, AccessNet, Scope, flag_names};

/// A staged filesystem rule: canonicalized path plus granted rights.
#[derive(Debug, Clone)]
struct PathRule {
    path: PathBuf,
    access: BitFlags<AccessFs>,
}

/// A staged TCP port rule.
#[derive(Debug, Clone, Copy)]
struct NetRule {
    port: u16,
    access: BitFlags<AccessNet>,
}

/// Builder for a Landlock ruleset applied to the calling process.
///
/// Staging methods can be called any number of times in any order before
/// [`apply`](Ruleset::apply); each returns `&mut Self` for chaining.
/// After `apply` the builder is terminal: every further call fails with
/// [`Error::AlreadyApplied`], whether the apply itself succeeded or not.
#[derive(Debug)]
pub struct Ruleset {
    abi: u32,
    strict: bool,
    path_rules: Vec<PathRule>,
    net_rules: Vec<NetRule>,
    allowed_scope: BitFlags<Scope>,
    allow_all_net: bool,
    allow_all_scope: bool,
    applied: bool,
}

impl Ruleset {
    /// Strict-mode builder against the detected kernel ABI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] when the kernel lacks Landlock.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_abi(kernel_abi()?.version, true))
    }

    /// Best-effort builder: rights this kernel cannot enforce are
    /// silently filtered instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] when the kernel lacks Landlock.
    pub fn best_effort() -> Result<Self, Error> {
        Ok(Self::with_abi(kernel_abi()?.version, false))
    }

    /// Builder against an explicit ABI version, without querying the
    /// kernel. For tests and for callers that probed the kernel
    /// themselves via [`kernel_abi`].
    pub fn with_abi(abi: u32, strict: bool) -> Self {
        Self {
            abi,
            strict,
            path_rules: Vec::new(),
            net_rules: Vec::new(),
            allowed_scope: BitFlags::empty(),
            allow_all_net: false,
            allow_all_scope: false,
            applied: false,
        }
    }

    /// ABI version this builder stages against.
    pub fn abi(&self) -> u32 {
        self.abi
    }

    /// Whether unsupported rights are hard errors.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether [`apply`](Ruleset::apply) has been attempted.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Stage a filesystem rule granting `access` beneath `path`.
    ///
    /// The path is canonicalized and must exist now; it is opened again
    /// at apply time.
    ///
    /// # Errors
    ///
    /// [`Error::Path`] if the path does not exist, [`Error::Compatibility`]
    /// in strict mode for rights beyond the detected ABI,
    /// [`Error::AlreadyApplied`] after apply.
    pub fn add_path_rule(
        &mut self,
        path: impl AsRef<Path>,
        access: impl Into<BitFlags<AccessFs>>,
    ) -> Result<&mut Self, Error> {
        self.ensure_not_applied()?;
        let path = path.as_ref();
        let resolved = std::fs::canonicalize(path).map_err(|source| Error::Path {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(access) = self.filter_requested(access.into())? {
            self.path_rules.push(PathRule {
                path: resolved,
                access,
            });
        }
        Ok(self)
    }

    /// Stage a TCP rule granting `access` on `port`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyNetAccess`] if `access` requests neither bind nor
    /// connect, [`Error::Compatibility`] in strict mode below ABI 4,
    /// [`Error::AlreadyApplied`] after apply.
    pub fn add_net_rule(
        &mut self,
        port: u16,
        access: impl Into<BitFlags<AccessNet>>,
    ) -> Result<&mut Self, Error> {
        self.ensure_not_applied()?;
        let access = access.into();
        if access.is_empty() {
            return Err(Error::EmptyNetAccess);
        }
        if let Some(access) = self.filter_requested(access)? {
            self.net_rules.push(NetRule { port, access });
        }
        Ok(self)
    }

    /// Exempt `scope` from the default scope restriction. Accumulates
    /// across calls; repeating a flag is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Compatibility`] in strict mode below ABI 6,
    /// [`Error::AlreadyApplied`] after apply.
    pub fn allow_scope(&mut self, scope: impl Into<BitFlags<Scope>>) -> Result<&mut Self, Error> {
        self.ensure_not_applied()?;
        if let Some(scope) = self.filter_requested(scope.into())? {
            self.allowed_scope |= scope;
        }
        Ok(self)
    }

    /// Leave the network category entirely unrestricted. Overrides any
    /// staged port rules: none of them are submitted at apply time.
    pub fn allow_all_network(&mut self) -> Result<&mut Self, Error> {
        self.ensure_not_applied()?;
        self.allow_all_net = true;
        Ok(self)
    }

    /// Leave every scope unrestricted, overriding per-scope allowances.
    pub fn allow_all_scope(&mut self) -> Result<&mut Self, Error> {
        self.ensure_not_applied()?;
        self.allow_all_scope = true;
        Ok(self)
    }

    /// Stage read access (file and directory) for each path.
    pub fn allow_read(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<&mut Self, Error> {
        self.add_path_rules(paths, read_access())
    }

    /// Stage write access (write, create, remove, truncate regular
    /// files) for each path.
    pub fn allow_write(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<&mut Self, Error> {
        self.add_path_rules(paths, write_access())
    }

    /// Stage execute access for each path.
    pub fn allow_execute(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<&mut Self, Error> {
        self.add_path_rules(paths, AccessFs::Execute.into())
    }

    /// Stage combined read and write access for each path.
    pub fn allow_read_write(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<&mut Self, Error> {
        self.add_path_rules(paths, read_access() | write_access())
    }

    /// Stage a connect rule for each port.
    pub fn allow_connect(
        &mut self,
        ports: impl IntoIterator<Item = u16>,
    ) -> Result<&mut Self, Error> {
        for port in ports {
            self.add_net_rule(port, AccessNet::ConnectTcp)?;
        }
        Ok(self)
    }

    /// Stage a bind rule for each port.
    pub fn allow_bind(&mut self, ports: impl IntoIterator<Item = u16>) -> Result<&mut Self, Error> {
        for port in ports {
            self.add_net_rule(port, AccessNet::BindTcp)?;
        }
        Ok(self)
    }

    /// Install the staged ruleset on the calling process. Irreversible.
    ///
    /// Steps, in order: set `NO_NEW_PRIVS`; create a ruleset handling the
    /// union of staged rights (and the default-restricted scopes); submit
    /// each staged rule; restrict self. The kernel handle is released on
    /// every exit path, and the builder is terminal afterwards whether or
    /// not the apply succeeded.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyApplied`] on a second call; otherwise
    /// [`Error::Ruleset`] wrapping the first kernel refusal. A failure
    /// after `NO_NEW_PRIVS` leaves the process in an ambiguous state -
    /// privilege acquisition disabled but no ruleset installed - so
    /// callers must treat it as fatal rather than continuing unsandboxed.
    pub fn apply(&mut self) -> Result<(), Error> {
        self.ensure_not_applied()?;
        // Terminal from here on: the commit is attempted at most once.
        self.applied = true;
        self.apply_inner()
    }

    fn apply_inner(&self) -> Result<(), Error> {
        // NO_NEW_PRIVS must be in place before any restriction is installed.
        set_no_new_privs().map_err(|source| Error::Ruleset {
            op: "prctl(NO_NEW_PRIVS)",
            source,
        })?;

        let handled_net = self.handled_net();
        let attr = LandlockRulesetAttr {
            handled_access_fs: self.handled_fs().bits(),
            handled_access_net: handled_net.bits(),
            scoped: self.restricted_scope().bits(),
        };
        let ruleset_fd = landlock_create_ruleset(&attr).map_err(|source| Error::Ruleset {
            op: "create_ruleset",
            source,
        })?;

        for rule in &self.path_rules {
            // The path was canonicalized at staging time but may have
            // vanished since; that surfaces here as a kernel-side refusal.
            let parent_fd = open_path(&rule.path).map_err(|source| Error::Ruleset {
                op: "open rule path",
                source,
            })?;
            let attr = LandlockPathBeneathAttr {
                allowed_access: rule.access.bits(),
                parent_fd: parent_fd.as_raw_fd(),
            };
            landlock_add_rule_path(&ruleset_fd, &attr).map_err(|source| Error::Ruleset {
                op: "add_rule(path_beneath)",
                source,
            })?;
        }

        if !handled_net.is_empty() {
            for rule in &self.net_rules {
                let attr = LandlockNetPortAttr {
                    allowed_access: rule.access.bits(),
                    port: u64::from(rule.port),
                };
                landlock_add_rule_net(&ruleset_fd, &attr).map_err(|source| Error::Ruleset {
                    op: "add_rule(net_port)",
                    source,
                })?;
            }
        }

        landlock_restrict_self(&ruleset_fd).map_err(|source| Error::Ruleset {
            op: "restrict_self",
            source,
        })
        // ruleset_fd drops here on success and on every error path above.
    }

    /// Shared compatibility policy: intersect the request with what the
    /// detected ABI supports. Strict mode fails on any unsupported
    /// remainder; a request filtered to nothing is dropped (`None`).
    fn filter_requested<T: Access>(
        &self,
        requested: BitFlags<T>,
    ) -> Result<Option<BitFlags<T>>, Error> {
        let supported = supported_access::<T>(self.abi);
        let unsupported = requested & !supported;
        if !unsupported.is_empty() && self.strict {
            return Err(Error::Compatibility {
                unsupported: flag_names(unsupported),
                abi: self.abi,
            });
        }
        let effective = requested & supported;
        if effective.is_empty() {
            Ok(None)
        } else {
            Ok(Some(effective))
        }
    }

    /// Filesystem rights the ruleset will handle: the union of staged
    /// rules. Empty means the category stays unrestricted.
    fn handled_fs(&self) -> BitFlags<AccessFs> {
        self.path_rules
            .iter()
            .fold(BitFlags::empty(), |acc, r| acc | r.access)
    }

    /// Network rights the ruleset will handle. The allow-all override
    /// wins over staged rules, which are then never submitted.
    fn handled_net(&self) -> BitFlags<AccessNet> {
        if self.allow_all_net {
            BitFlags::empty()
        } else {
            self.net_rules
                .iter()
                .fold(BitFlags::empty(), |acc, r| acc | r.access)
        }
    }

    /// Scopes to restrict: everything the ABI supports minus explicit
    /// allowances, or nothing under the allow-all override.
    fn restricted_scope(&self) -> BitFlags<Scope> {
        if self.allow_all_scope {
            BitFlags::empty()
        } else {
            supported_access::<Scope>(self.abi) & !self.allowed_scope
        }
    }

    fn add_path_rules(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
        access: BitFlags<AccessFs>,
    ) -> Result<&mut Self, Error> {
        for path in paths {
            self.add_path_rule(path, access)?;
        }
        Ok(self)
    }

    fn ensure_not_applied(&self) -> Result<(), Error> {
        if self.applied {
            Err(Error::AlreadyApplied)
        } else {
            Ok(())
        }
    }
}

fn read_access() -> BitFlags<AccessFs> {
    AccessFs::ReadFile | AccessFs::ReadDir
}

fn write_access() -> BitFlags<AccessFs> {
    AccessFs::WriteFile | AccessFs::MakeReg | AccessFs::RemoveFile | AccessFs::Truncate
}

#[inline]
fn open_path(path: &Path) -> Result<OwnedFd, Errno> {
    let path_c = CString::new(path.as_os_str().as_bytes()).map_err(|_| Errno::INVAL)?;
    // SAFETY: path_c is a valid NUL-terminated string.
    let fd = unsafe { libc::open(path_c.as_ptr(), libc::O_PATH | libc::O_CLOEXEC) };
    if fd < 0 {
        Err(last_errno())
    } else {
        // SAFETY: On success, fd is a freshly opened, owned descriptor.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }
}
