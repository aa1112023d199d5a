//! Shared helpers for locating and building the fixture engine modules.

use std::env;
use std::path::PathBuf;
use std::process::Command;

pub const MASTER_KEY_ENV: &str = "VEIL_MASTER_KEY_HEX";

/// Path to the complete fixture engine, building it if needed.
pub fn full_module() -> String {
    fixture("veil-testmod", "veil_testmod")
}

/// Path to the incomplete fixture engine, building it if needed.
pub fn partial_module() -> String {
    fixture("veil-testmod-partial", "veil_testmod_partial")
}

/// Points the fixture's environment constructor at a valid master key.
pub fn ensure_master_key() {
    env::set_var(MASTER_KEY_ENV, "22".repeat(32));
}

fn fixture(package: &str, artifact: &str) -> String {
    let file = format!(
        "{}{}{}",
        env::consts::DLL_PREFIX,
        artifact,
        env::consts::DLL_SUFFIX
    );
    let path = target_dir().join(file);
    if !path.exists() {
        build(package);
    }
    assert!(
        path.exists(),
        "fixture module {} was not built",
        path.display()
    );
    path.to_str()
        .expect("fixture path is valid UTF-8")
        .to_string()
}

// target/<profile>/deps/<test-bin> -> target/<profile>
fn target_dir() -> PathBuf {
    let mut dir = env::current_exe().expect("test binary path");
    dir.pop();
    if dir.ends_with("deps") {
        dir.pop();
    }
    dir
}

fn build(package: &str) {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(cargo)
        .args(["build", "-p", package])
        .status()
        .expect("spawn cargo build for the fixture module");
    assert!(status.success(), "building {package} failed");
}
