#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_VARS: [&str; 6] = [
    "SITEMAPPER_CONFIG",
    "SITEMAPPER_FOLDER",
    "SITEMAPPER_BASE_URL",
    "SITEMAPPER_INDEX_NAME",
    "SITEMAPPER_MAX_IN_FLIGHT",
    "SITEMAPPER_PING",
];

/// Create a `sitemapper` command isolated from the user's configuration.
#[allow(dead_code)]
pub fn sitemapper_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemapper"));
    cmd.timeout(CMD_TIMEOUT);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.current_dir(home);
    cmd
}

/// Write `lines` as an input file and return its path.
#[allow(dead_code)]
pub fn write_input(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Sorted file names inside `dir`.
#[allow(dead_code)]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
