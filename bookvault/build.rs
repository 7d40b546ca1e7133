//! Stamps the binary with its git revision, build time and cargo profile
//! for the startup banner and `/health`.

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    // Source tarballs have no .git
    let hash = git_short_hash().unwrap_or_else(|| UNKNOWN.to_string());
    let built_at = chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    let profile = env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    emit("GIT_HASH", &hash);
    emit("BUILD_TIMESTAMP", &built_at);
    emit("BUILD_PROFILE", &profile);
}
