use std::process::Command;

/// Embeds `CUECAST_VERSION`: the package version, plus the short commit hash
/// (and `-dirty`) when built from a git checkout.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let version = match commit_hash() {
        Some(hash) => format!("{pkg}+{hash}"),
        None => pkg,
    };
    println!("cargo:rustc-env=CUECAST_VERSION={version}");
}

fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--exclude", "*"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}
