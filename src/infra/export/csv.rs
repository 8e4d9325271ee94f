use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::usecase::services::export_service::export_file_name;

pub fn default_export_name() -> String {
    export_file_name(chrono::Utc::now().date_naive())
}

pub fn write_csv_export(path: &Path, csv_text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export dir: {}", parent.display()))?;
    }
    std::fs::write(path, csv_text)
        .with_context(|| format!("failed to write csv export: {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = csv_text.len(), "csv exported");
    Ok(())
}

/// Asks for a destination and writes the export there. `Ok(None)` when the
/// dialog is cancelled.
pub fn save_csv_export_with_dialog(csv_text: &str) -> Result<Option<PathBuf>> {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(default_export_name())
        .save_file()
    else {
        return Ok(None);
    };
    write_csv_export(&path, csv_text)?;
    Ok(Some(path))
}
