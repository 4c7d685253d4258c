use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Remove every whitespace character, including interior ones
/// e.g., " 10.0. 0.1 " -> "10.0.0.1"
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Validated-record filename for a site
/// e.g., "S1" -> "S1_site_info.json"
pub fn site_info_filename(site_id: &str) -> String {
    format!("{}_site_info.json", site_id)
}

/// Rendered config filename for a site
/// e.g., "S1" -> "S1_Branch_config.yml"
pub fn branch_config_filename(site_id: &str) -> String {
    format!("{}_Branch_config.yml", site_id)
}

/// Validate a site identifier before it is used to build file paths.
/// No path separators, control characters, or leading dot.
pub fn is_valid_site_id(site_id: &str) -> bool {
    if site_id.trim().is_empty() || site_id.len() > 128 || site_id.starts_with('.') {
        return false;
    }
    !site_id
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Write a file so readers never observe partial content.
/// Writes a sibling temp file first, then renames it over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let tmp = temp_sibling(path);
    let display = path.display().to_string();

    std::fs::write(&tmp, contents).map_err(|e| PipelineError::io(&display, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(PipelineError::io(&display, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
