//! selflock CLI - apply Landlock restrictions to this process, then exec
//! a command.
//!
//! ```text
//! selflock --allow-read /tmp --allow-execute /usr \
//!     --allow-connect 443 --allow-all-scope -- curl https://example.com
//! ```
//!
//! The sandbox is applied before the exec, so the target command (and
//! everything it spawns) runs restricted.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, exit};

use clap::Parser;
use selflock::{Error, Ruleset, Scope};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "selflock",
    version,
    about = "Run a command under a Landlock sandbox"
)]
struct Cli {
    /// Allow read access to PATH(s)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    allow_read: Vec<PathBuf>,

    /// Allow write access to PATH(s)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    allow_write: Vec<PathBuf>,

    /// Allow execute access to PATH(s)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    allow_execute: Vec<PathBuf>,

    /// Allow read and write access to PATH(s)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    allow_read_write: Vec<PathBuf>,

    /// Allow TCP connect to PORT(s)
    #[arg(long, value_name = "PORT", num_args = 1..)]
    allow_connect: Vec<u16>,

    /// Allow TCP bind to PORT(s)
    #[arg(long, value_name = "PORT", num_args = 1..)]
    allow_bind: Vec<u16>,

    /// Disable network sandboxing (allow all TCP connections)
    #[arg(long)]
    allow_all_network: bool,

    /// Allow connecting to abstract unix sockets outside the sandbox
    #[arg(long)]
    allow_abstract_unix: bool,

    /// Allow sending signals outside the sandbox
    #[arg(long)]
    allow_signals: bool,

    /// Disable scope restrictions (allow all IPC and signals)
    #[arg(long)]
    allow_all_scope: bool,

    /// Don't fail on features this kernel cannot enforce
    #[arg(long)]
    best_effort: bool,

    /// Log the applied restrictions before executing the command
    #[arg(short, long)]
    verbose: bool,

    /// Command to execute
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log_restrictions(&cli);

    if let Err(e) = sandbox(&cli) {
        eprintln!("selflock: error: {e}");
        match e {
            Error::Unavailable(_) => {
                eprintln!("hint: landlock requires Linux 5.13+ with CONFIG_SECURITY_LANDLOCK=y");
            }
            Error::Compatibility { .. } => {
                eprintln!("hint: use --best-effort to skip rights this kernel cannot enforce");
            }
            _ => {}
        }
        exit(1);
    }

    let err = Command::new(&cli.command[0]).args(&cli.command[1..]).exec();
    // exec only returns on failure.
    eprintln!(
        "selflock: failed to execute {}: {err}",
        cli.command[0].to_string_lossy()
    );
    exit(match err.kind() {
        ErrorKind::NotFound => 127,
        ErrorKind::PermissionDenied => 126,
        _ => 1,
    });
}

fn sandbox(cli: &Cli) -> Result<(), Error> {
    let mut ruleset = if cli.best_effort {
        Ruleset::best_effort()?
    } else {
        Ruleset::new()?
    };

    ruleset
        .allow_read(&cli.allow_read)?
        .allow_write(&cli.allow_write)?
        .allow_execute(&cli.allow_execute)?
        .allow_read_write(&cli.allow_read_write)?;

    if cli.allow_all_network {
        ruleset.allow_all_network()?;
    } else {
        ruleset
            .allow_connect(cli.allow_connect.iter().copied())?
            .allow_bind(cli.allow_bind.iter().copied())?;
    }

    if cli.allow_all_scope {
        ruleset.allow_all_scope()?;
    } else {
        if cli.allow_abstract_unix {
            ruleset.allow_scope(Scope::AbstractUnixSocket)?;
        }
        if cli.allow_signals {
            ruleset.allow_scope(Scope::Signal)?;
        }
    }

    ruleset.apply()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "selflock=info" } else { "selflock=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn log_restrictions(cli: &Cli) {
    if !cli.allow_read.is_empty() {
        info!(paths = ?cli.allow_read, "read access");
    }
    if !cli.allow_write.is_empty() {
        info!(paths = ?cli.allow_write, "write access");
    }
    if !cli.allow_execute.is_empty() {
        info!(paths = ?cli.allow_execute, "execute access");
    }
    if !cli.allow_read_write.is_empty() {
        info!(paths = ?cli.allow_read_write, "read/write access");
    }
    if cli.allow_all_network {
        info!("network: all allowed");
    } else if !cli.allow_connect.is_empty() || !cli.allow_bind.is_empty() {
        info!(connect = ?cli.allow_connect, bind = ?cli.allow_bind, "tcp ports");
    } else {
        info!("network: unrestricted (no port rules staged)");
    }
    if cli.allow_all_scope {
        info!("scope: all allowed");
    } else {
        info!(
            abstract_unix = cli.allow_abstract_unix,
            signals = cli.allow_signals,
            "scope restricted with exceptions"
        );
    }
}
