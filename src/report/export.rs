use tokio::io::{AsyncWriteExt, BufWriter};

use super::LoadTestReport;

/// Serializes `report` as pretty JSON.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn report_json(report: &LoadTestReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub(crate) async fn export_json(path: &str, report: &LoadTestReport) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let json = serde_json::to_vec_pretty(report).map_err(std::io::Error::other)?;
    writer.write_all(&json).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
