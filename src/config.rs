//! Loading `cellbook.toml`.
//!
//! Every key is optional; missing keys keep the built-in defaults:
//!
//! ```toml
//! history_capacity = 500
//! default_columns = 10
//! default_rows = 40
//! max_columns = 26
//! max_rows = 1000
//! log_level = "warn"
//! ```

use cellbook_core::Settings;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Load settings from `config_file`, or from the user config dir when no
/// file is given. Problems are returned as warnings and fall back to
/// defaults.
pub fn load_settings(config_file: Option<&Path>) -> (Settings, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = config_file.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = config_path else {
        return (Settings::default(), warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Settings::default(), warnings);
    }

    let settings = match std::fs::read_to_string(&path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => settings,
            Err(err) => {
                warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                Settings::default()
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            Settings::default()
        }
    };
    (settings, warnings)
}

/// Parse TOML text into settings.
pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str::<Settings>(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellbook")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("cellbook.toml");
    Some(path)
}
