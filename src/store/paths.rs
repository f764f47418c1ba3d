// Storage path utilities.
// Resolves platform locations for the store file, config file and log file.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "adopr")
}

/// Base data directory (~/.local/share/adopr on Linux).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Base config directory (~/.config/adopr on Linux).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the persistent key-value store document.
pub fn storage_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("storage.json"))
}

/// Path to the user configuration file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// Path to the log file used while the TUI owns the terminal.
pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("adopr.log"))
}
