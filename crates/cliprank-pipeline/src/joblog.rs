//! Per-job CSV log.

use std::path::{Path, PathBuf};

use tracing::info;

use cliprank_models::ClipLogRow;

use crate::error::PipelineResult;

/// Path of the job log for a media id.
pub fn log_path(output_dir: &Path, media_id: &str) -> PathBuf {
    output_dir.join(format!("{}_clips_log.csv", media_id))
}

/// Write the job log: UTF-8, header row, comma-delimited, quoted fields,
/// exactly one row per emitted clip in rank order.
pub fn write_job_log(
    output_dir: &Path,
    media_id: &str,
    rows: &[ClipLogRow],
) -> PipelineResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = log_path(output_dir, media_id);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_path(&path)?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Job log written");
    Ok(path)
}
