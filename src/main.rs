use std::env;
use std::path::PathBuf;
use std::process::{exit, Command};

/// Candidate locations for the gateway binary, most specific first
fn gateway_candidates() -> Vec<PathBuf> {
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    let name = if cfg!(windows) { "api-gateway.exe" } else { "api-gateway" };

    let mut candidates = Vec::new();
    if let Ok(dir) = env::current_dir() {
        candidates.push(dir.join("target").join(profile).join(name));
    }
    if let Ok(dir) = env::var("CARGO_WORKSPACE_DIR") {
        candidates.push(PathBuf::from(dir).join("target").join(profile).join(name));
    }
    candidates
}

/// `cargo run` at the workspace root proxies to the api-gateway binary,
/// forwarding all arguments and the exit code.
fn main() {
    let candidates = gateway_candidates();
    let Some(binary) = candidates.iter().find(|p| p.exists()) else {
        eprintln!("api-gateway binary not found; build it with `cargo build -p api-gateway`");
        for candidate in &candidates {
            eprintln!("  looked in {}", candidate.display());
        }
        exit(1);
    };

    let status = match Command::new(binary).args(env::args().skip(1)).status() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Failed to launch {}: {}", binary.display(), e);
            exit(1);
        }
    };
    exit(status.code().unwrap_or(1));
}
