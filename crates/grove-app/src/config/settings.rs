//! Options file parser for grove.toml

use super::types::TreeOptions;
use grove_core::prelude::*;
use std::path::Path;

/// Default options file name looked up next to the data file
pub const OPTIONS_FILENAME: &str = "grove.toml";

/// Load options from a TOML file.
///
/// Missing or invalid files fall back to defaults; problems are logged,
/// never fatal.
pub fn load_options(path: &Path) -> TreeOptions {
    if !path.exists() {
        debug!("No options file at {:?}, using defaults", path);
        return TreeOptions::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(options) => {
                debug!("Loaded options from {:?}", path);
                options
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                TreeOptions::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            TreeOptions::default()
        }
    }
}

/// Write options to a TOML file (atomic replace).
pub fn save_options(path: &Path, options: &TreeOptions) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;
        }
    }

    let content = toml::to_string_pretty(options)
        .map_err(|e| Error::config(format!("Failed to serialize options: {}", e)))?;
    let full_content = format!("# Grove tree options\n\n{}", content);

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved options to {:?}", path);
    Ok(())
}
