//! Minimal self-sandboxing example: confine reads and writes to a
//! scratch directory, then show the sandbox holding.
//!
//! Only right-kinds referenced by some rule are enforced: granting read
//! and write beneath the scratch directory makes those rights denied
//! everywhere else.

use selflock::Ruleset;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scratch = std::env::temp_dir().join("selflock-minimal");
    std::fs::create_dir_all(&scratch)?;
    let probe = scratch.join("probe.txt");
    std::fs::write(&probe, "text data")?;

    Ruleset::best_effort()?
        .allow_read_write([&scratch])?
        .allow_execute(["/usr"])?
        .apply()?;

    println!("sandbox active");
    println!("read inside ok: {}", std::fs::read_to_string(&probe)?);

    match std::fs::read_to_string("/etc/passwd") {
        Err(e) => println!("read outside blocked: {e}"),
        Ok(_) => println!("read outside unexpectedly allowed"),
    }

    match std::fs::write("/tmp/selflock-escape.txt", "blocked!") {
        Err(e) => println!("write outside blocked: {e}"),
        Ok(()) => println!("write outside unexpectedly allowed"),
    }
    Ok(())
}
