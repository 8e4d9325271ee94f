use anyhow::{Context, Result};

use crate::domain::entities::row::{display_value, Row};

/// Renders rows as CSV.
///
/// The header is the key list of the first row; every record lists its own
/// values in its own key order. Returns `None` when there is nothing to export.
pub fn rows_to_csv(rows: &[&Row]) -> Result<Option<String>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(first.keys())
        .context("failed to write csv header")?;
    for row in rows {
        writer
            .write_record(row.fields().values().map(|value| display_value(value).into_owned()))
            .with_context(|| format!("failed to write csv record for row {}", row.id()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {err}"))?;
    let text = String::from_utf8(bytes).context("csv output should be utf-8")?;
    Ok(Some(text))
}

pub fn export_file_name(date: chrono::NaiveDate) -> String {
    format!("export-{}.csv", date.format("%Y-%m-%d"))
}
