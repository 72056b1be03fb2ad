//! Tests against the real kernel that never restrict the test process:
//! detection, and a gateway round trip that creates and releases a
//! ruleset without committing it.

use std::os::fd::AsRawFd;

use selflock_sys::landlock::{
    LANDLOCK_ACCESS_FS_READ_DIR, LANDLOCK_ACCESS_FS_READ_FILE, LandlockPathBeneathAttr,
    LandlockRulesetAttr, landlock_create_ruleset,
};

#[test]
fn detection_is_memoized() {
    let first = selflock::kernel_abi();
    let second = selflock::kernel_abi();
    match (first, second) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a, b);
            assert!(a.version >= 1);
        }
        (Err(_), Err(_)) => {}
        _ => panic!("detection result changed between calls"),
    }
}

#[test]
fn gateway_round_trip_without_restriction() {
    if selflock::kernel_abi().is_err() {
        eprintln!("skipping: landlock unavailable");
        return;
    }

    let attr = LandlockRulesetAttr {
        handled_access_fs: LANDLOCK_ACCESS_FS_READ_FILE | LANDLOCK_ACCESS_FS_READ_DIR,
        handled_access_net: 0,
        scoped: 0,
    };
    let ruleset_fd = landlock_create_ruleset(&attr).expect("create ruleset");

    let dir = std::fs::File::open("/tmp").expect("open /tmp");
    let rule = LandlockPathBeneathAttr {
        allowed_access: LANDLOCK_ACCESS_FS_READ_FILE | LANDLOCK_ACCESS_FS_READ_DIR,
        parent_fd: dir.as_raw_fd(),
    };
    selflock_sys::landlock::landlock_add_rule_path(&ruleset_fd, &rule).expect("add rule");

    // Dropping the fd abandons the ruleset; the test process is never
    // restricted.
    drop(ruleset_fd);
}

#[test]
fn builder_against_detected_kernel() {
    let ruleset = match selflock::Ruleset::new() {
        Ok(r) => r,
        Err(selflock::Error::Unavailable(_)) => {
            eprintln!("skipping: landlock unavailable");
            return;
        }
        Err(e) => panic!("unexpected detection error: {e}"),
    };
    assert!(ruleset.abi() >= 1);
    assert!(ruleset.is_strict());
    assert!(!ruleset.is_applied());
}
