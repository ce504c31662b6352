// SPDX-License-Identifier: MIT OR Apache-2.0

//! Utility functions for ragctx

use std::path::{Path, PathBuf};

/// The name of the per-project data directory
pub const DATA_DIR: &str = ".ragctx";

/// Result of finding a data root
#[derive(Debug)]
pub struct DataRoot {
    /// The directory containing the .ragctx folder
    pub root: PathBuf,
    /// The full path to the .ragctx folder
    pub data_path: PathBuf,
    /// Whether this is the start directory or a parent
    pub is_parent: bool,
}

/// Find the nearest .ragctx directory by walking up from the given path.
/// Returns None if no .ragctx directory is found.
pub fn find_data_root(start: impl AsRef<Path>) -> Option<DataRoot> {
    let mut current = start.as_ref().to_path_buf();

    if let Ok(canonical) = current.canonicalize() {
        current = canonical;
    }

    let original = current.clone();

    loop {
        let data_path = current.join(DATA_DIR);
        if data_path.is_dir() {
            return Some(DataRoot {
                root: current.clone(),
                data_path,
                is_parent: current != original,
            });
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Get the data directory for a path, walking up to find parent data directories.
/// Falls back to `<path>/.ragctx` if none exists yet.
pub fn get_data_path(path: impl AsRef<Path>) -> PathBuf {
    match find_data_root(&path) {
        Some(root) => root.data_path,
        None => path.as_ref().join(DATA_DIR),
    }
}

/// Default location of a named file inside the data directory of the working directory.
pub fn default_data_path(file_name: &str) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    get_data_path(cwd).join(file_name)
}
