use std::env;
use std::process::Command;

/// Run a command and return its trimmed stdout, if it succeeded
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn export(key: &str, value: impl AsRef<str>) {
    println!("cargo:rustc-env={}={}", key, value.as_ref());
}

fn report_build_profile() {
    export(
        "BUILD_PROFILE",
        env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
    );
}

fn report_enabled_features() {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_").map(str::to_lowercase))
        .collect();
    features.sort();

    if features.is_empty() {
        features.push("none".to_string());
    }

    export("BUILD_FEATURES", features.join(","));
}

fn report_repository_version() {
    let version = env::var("CI_BUILD_REF")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| command_output("git", &["describe", "--always", "--dirty", "--long", "--tags"]))
        .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
        .or_else(|| env::var("CARGO_PKG_VERSION").ok())
        .unwrap_or_else(|| "unknown".to_string());

    export("REPO_VERSION", version);
}

fn report_build_timestamp() {
    export("BUILD_TIMESTAMP", chrono::Utc::now().to_rfc3339());
}

fn report_rust_version() {
    export(
        "RUST_VERSION",
        command_output("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string()),
    );
}

fn report_target_info() {
    if let Ok(target) = env::var("TARGET") {
        export("BUILD_TARGET", target);
    }
    if let Ok(host) = env::var("HOST") {
        export("BUILD_HOST", host);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");

    report_build_profile();
    report_enabled_features();
    report_repository_version();
    report_build_timestamp();
    report_rust_version();
    report_target_info();
}
