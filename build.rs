use chrono::Utc;
use std::env;
use std::fs::{metadata, File};
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("version.rs");
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let cargo_toml_path = Path::new(&manifest_dir).join("Cargo.toml");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");

    if !needs_regeneration(&dest_path, &cargo_toml_path) {
        return;
    }

    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path).unwrap();
    let scan_api_version = read_scan_api_version(&cargo_toml_content);
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let git_hash = short_git_hash();

    let mut f = File::create(&dest_path).unwrap();
    #[allow(clippy::uninlined_format_args)]
    writeln!(
        &mut f,
        r###"pub const SCAN_API_VERSION: &str = "{}";
pub const BUILD_TIME: &str = "{}";
pub const GIT_HASH: &str = "{}";"###,
        scan_api_version, build_time, git_hash
    )
    .unwrap();
}

/// version.rs is regenerated when missing or older than Cargo.toml
fn needs_regeneration(dest_path: &Path, cargo_toml_path: &Path) -> bool {
    if !dest_path.exists() {
        return true;
    }
    let generated = metadata(dest_path).and_then(|m| m.modified());
    let manifest = metadata(cargo_toml_path).and_then(|m| m.modified());
    match (generated, manifest) {
        (Ok(generated), Ok(manifest)) => manifest > generated,
        _ => true,
    }
}

fn read_scan_api_version(cargo_toml_content: &str) -> String {
    cargo_toml_content
        .parse::<toml::Table>()
        .ok()
        .and_then(|cargo_toml| {
            cargo_toml
                .get("package")
                .and_then(|p| p.as_table())
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.as_table())
                .and_then(|m| m.get("scan_api_version"))
                .and_then(|v| v.as_integer())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn short_git_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
