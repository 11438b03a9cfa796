//! Stamps the binary with the values `routes::health::VersionInfo` reports:
//! `GIT_COMMIT_FULL`, `GIT_COMMIT_SHORT` and `BUILD_TIMESTAMP`.

use std::process::Command;

const SHORT_LEN: usize = 7;

/// Commit of the checkout, if this is a git checkout at all
fn head_commit() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!commit.is_empty()).then_some(commit)
}

fn main() {
    let (full, short) = match head_commit() {
        Some(full) => {
            let short = full.chars().take(SHORT_LEN).collect();
            (full, short)
        }
        None => ("unknown".to_string(), "unknown".to_string()),
    };

    println!("cargo:rustc-env=GIT_COMMIT_FULL={full}");
    println!("cargo:rustc-env=GIT_COMMIT_SHORT={short}");
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );

    println!("cargo:rerun-if-changed=.git/HEAD");
}
