use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::anomaly::AnomalyReport;
use crate::error::Result;
use crate::schema::{ANOMALY_KIND, DATE, DEVIATION, DEVIATION_IN_SIGMA, SHIFT_NUMBER, SHIFT_TIME};

/// Spreadsheet applications need the byte-order mark to detect UTF-8 in CSV files.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the anomaly table as comma-separated UTF-8 text prefixed with a BOM. The two
/// deviation columns are rounded to two decimals; the metric value is written as is.
pub fn write_anomaly_csv<W: Write>(report: &AnomalyReport, mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        DATE,
        SHIFT_TIME,
        SHIFT_NUMBER,
        report.metric.as_str(),
        ANOMALY_KIND,
        DEVIATION,
        DEVIATION_IN_SIGMA,
    ])?;
    for record in &report.records {
        csv_writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.shift_time.clone().unwrap_or_default(),
            record.shift_number.clone(),
            record.value.to_string(),
            record.kind.to_string(),
            format!("{:.2}", record.deviation),
            format!("{:.2}", record.deviation_in_sigma),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn anomalies_csv_bytes(report: &AnomalyReport) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_anomaly_csv(report, &mut buffer)?;
    Ok(buffer)
}

pub fn export_anomalies_csv(report: &AnomalyReport, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_anomaly_csv(report, BufWriter::new(file))
}
