use std::path::Path;
use std::process::Command;

const SHA_ENV: &str = "SHUXIN_BUILD_SHA";

/// Short commit of the workspace, or `None` outside a git checkout.
fn git_short_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = Path::new(&manifest_dir).join("..");

    println!("cargo:rerun-if-env-changed={SHA_ENV}");
    println!("cargo:rerun-if-changed={}", workspace.join(".git/HEAD").display());

    // Release packaging builds from a tarball and passes the commit in.
    let sha = std::env::var(SHA_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| git_short_sha(&workspace))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env={SHA_ENV}={sha}");
}
