//! Data log to CSV conversion.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::DateTime;
use eyre::{Result, WrapErr};
use turbidostat_core::LogRecord;

/// Timestamp layout of the CSV `Time` column (UTC).
pub const TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub skipped: usize,
}

/// Convert `input` (one JSON record per line) to a `Time, OD` CSV at `output`.
pub fn export_file(input: &Path, output: &Path) -> Result<ExportSummary> {
    let src = File::open(input).wrap_err_with(|| format!("open data log {}", input.display()))?;
    let dst = File::create(output).wrap_err_with(|| format!("create {}", output.display()))?;
    let summary = convert(BufReader::new(src), dst)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        rows = summary.rows,
        skipped = summary.skipped,
        "exported data log"
    );
    Ok(summary)
}

/// Lines that do not parse are skipped and counted.
pub fn convert<R: BufRead, W: Write>(input: R, output: W) -> Result<ExportSummary> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(output);
    wtr.write_record(["Time", " OD"])?;

    let mut summary = ExportSummary::default();
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = match LogRecord::parse_line(&line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping unparsable log line");
                summary.skipped += 1;
                continue;
            }
        };
        let Some(when) = DateTime::from_timestamp(record.time, 0) else {
            tracing::warn!(line = idx + 1, time = record.time, "skipping out-of-range timestamp");
            summary.skipped += 1;
            continue;
        };
        wtr.write_record([
            when.format(TIME_FORMAT).to_string(),
            format!(" {}", record.od),
        ])?;
        summary.rows += 1;
    }
    wtr.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_records_and_skips_garbage() {
        let log = "{\"time\":0, \"OD\":0.1234, \"Z\":1.0000, \"U\":5}\n\
                   not json\n\
                   \n\
                   {\"time\":1700000000, \"OD\":0.5}\n";
        let mut out = Vec::new();
        let summary = convert(log.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, ExportSummary { rows: 2, skipped: 1 });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Time, OD\n01/01/1970 00:00:00, 0.1234\n11/14/2023 22:13:20, 0.5\n"
        );
    }
}
