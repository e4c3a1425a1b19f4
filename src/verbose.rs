//! Verbose reporting of channel activity.

use anyhow::{Context, Result};
use page_stream::{Channel, Direction, Options, Stats};
use serde::Serialize;

use crate::args::Format;
use crate::output::Output;

/// Handles formatting and display of channel reports.
#[derive(Debug)]
pub(crate) struct Verbose {
    output: Output,
}

impl Default for Verbose {
    /// Default verbose logger writes to stderr.
    fn default() -> Self {
        Self {
            output: Output::stderr(),
        }
    }
}

/// What one channel did, serializable to JSON and CSV.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Report {
    source: String,
    mode: String,
    direction: Direction,
    options: Options,
    file_size: u64,
    position: u64,
    records: Option<u64>,
    stats: Stats,
}

impl Report {
    /// Create from a finished channel.
    pub(crate) fn from_channel(channel: &Channel, records: Option<u64>) -> Self {
        Self {
            source: channel.path().display().to_string(),
            mode: channel.mode().to_string(),
            direction: channel.direction(),
            options: channel.options(),
            file_size: channel.file_size(),
            position: channel.tell(),
            records,
            stats: channel.stats(),
        }
    }

    /// Get all fields as name-value pairs.
    fn field_pairs(&self) -> Vec<(&str, String)> {
        let stats = &self.stats;

        vec![
            ("source", self.source.clone()),
            ("mode", self.mode.clone()),
            ("page-size", self.options.page_size.to_string()),
            ("alloc-size", self.options.alloc_size.to_string()),
            ("file-size", self.file_size.to_string()),
            ("position", self.position.to_string()),
            ("direction", self.direction.to_string()),
            (
                "records",
                self.records.map_or("none".to_string(), |v| v.to_string()),
            ),
            ("refills", stats.refills.to_string()),
            ("flushes", stats.flushes.to_string()),
            ("reallocations", stats.reallocations.to_string()),
            ("seeks", stats.seeks.to_string()),
            ("bytes-fetched", stats.bytes_fetched.to_string()),
            ("bytes-flushed", stats.bytes_flushed.to_string()),
        ]
    }
}

impl Verbose {
    /// Writes reports in the requested format.
    pub(crate) fn write_reports(&mut self, reports: &[Report], format: Format) -> Result<()> {
        match format {
            Format::Json => self.write_json(reports),
            Format::Csv => self.write_csv(reports),
            Format::Text => self.write_text(reports),
        }?;

        self.output.flush()
    }

    /// Write reports in JSON format.
    fn write_json(&mut self, reports: &[Report]) -> Result<()> {
        let json = serde_json::to_string(reports).context("failed to serialize JSON report")?;

        self.output
            .write_chunk(format!("{json}\n").as_bytes())
            .context("failed to write JSON output")
    }

    /// Write reports in CSV format, one row per channel.
    fn write_csv(&mut self, reports: &[Report]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        if let Some(first) = reports.first() {
            writer.write_record(first.field_pairs().iter().map(|(name, _)| *name))?;
        }
        for report in reports {
            writer.write_record(report.field_pairs().iter().map(|(_, value)| value))?;
        }

        let data = writer.into_inner().context("failed to finish CSV output")?;
        self.output
            .write_chunk(&data)
            .context("failed to write CSV output")
    }

    /// Write reports in text format, separated by blank lines.
    fn write_text(&mut self, reports: &[Report]) -> Result<()> {
        for (index, report) in reports.iter().enumerate() {
            if index > 0 {
                self.output.write_chunk(b"\n")?;
            }

            report
                .field_pairs()
                .into_iter()
                .try_for_each(|(field_name, value)| {
                    self.output
                        .write_chunk(format!("{field_name} {value}\n").as_bytes())
                })?;
        }

        Ok(())
    }
}
