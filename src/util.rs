use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "HACKTRACK_DATA_DIR";
pub const PROJECT_LIST_FILE: &str = "projects.csv";

/// `HACKTRACK_DATA_DIR` if set, else the `data/` directory shipped with the crate.
pub fn default_data_dir() -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join("data"),
    }
}

pub fn default_project_list(data_dir: &Path) -> PathBuf {
    data_dir.join(PROJECT_LIST_FILE)
}

pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
