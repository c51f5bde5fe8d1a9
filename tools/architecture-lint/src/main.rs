//! Runs the layer lint over `tag-helper/src` and exits non-zero on any
//! violation.
//!
//! The workspace root is taken from `CARGO_WORKSPACE_DIR` when set, else
//! found by walking up from the current directory.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    let Some(root) = workspace_root() else {
        let _ = writeln!(
            stderr,
            "unable to locate the workspace root (no Cargo.toml declaring [workspace])"
        );
        return ExitCode::FAILURE;
    };
    match architecture_lint::lint_crate_sources(&root.join("tag-helper")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            ExitCode::FAILURE
        }
    }
}

fn workspace_root() -> Option<PathBuf> {
    let starts = [
        env::var_os("CARGO_WORKSPACE_DIR").map(PathBuf::from),
        env::current_dir().ok(),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];
    starts
        .into_iter()
        .flatten()
        .find_map(|start| start.ancestors().find(|dir| declares_workspace(dir)).map(Path::to_path_buf))
}

fn declares_workspace(dir: &Path) -> bool {
    fs::read_to_string(dir.join("Cargo.toml"))
        .is_ok_and(|contents| contents.contains("[workspace]"))
}
