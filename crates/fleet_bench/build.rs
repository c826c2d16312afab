use std::process::Command;

/// Stamps each run result with the commit it was produced from.
fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs");

    let git = |args: &[&str]| Command::new("git").args(args).output().ok();

    let sha = git(&["rev-parse", "HEAD"])
        .filter(|o| o.status.success())
        .map_or_else(
            || "unknown".to_string(),
            |o| String::from_utf8_lossy(&o.stdout).trim().to_string(),
        );
    // Outside a checkout there is nothing to compare against; call it dirty.
    let dirty = !git(&["diff", "--quiet"]).is_some_and(|o| o.status.success());

    println!("cargo:rustc-env=GIT_SHA={sha}");
    println!("cargo:rustc-env=GIT_DIRTY={dirty}");
}
