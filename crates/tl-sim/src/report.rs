//! Per-cycle reports emitted by the control task.
//!
//! Sinks are fire-and-forget: a sink that fails to deliver logs a warning and the
//! control loop carries on.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::{info, warn};

/// What one control cycle saw and decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlReport {
    /// Quantized temperature received from the sampler (°C).
    pub temperature: i32,
    /// Cooling power commanded in response (%).
    pub cooling_power: f64,
}

impl fmt::Display for ControlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature received: {} C - Cooling Power: {:.1}%",
            self.temperature, self.cooling_power
        )
    }
}

pub trait ReportSink: Send + Sync {
    fn report(&self, report: &ControlReport);
}

/// Line format for writer-backed sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn render(&self, report: &ControlReport) -> Result<String, serde_json::Error> {
        match self {
            ReportFormat::Text => Ok(report.to_string()),
            ReportFormat::Json => serde_json::to_string(report),
        }
    }
}

/// Writes one line per report to any [`Write`].
#[derive(Debug)]
pub struct WriterSink<W> {
    format: ReportFormat,
    out: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            format,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WriterSink<io::Stdout> {
    /// Console sink, the default report destination.
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write + Send> ReportSink for WriterSink<W> {
    fn report(&self, report: &ControlReport) {
        let line = match self.format.render(report) {
            Ok(line) => line,
            Err(e) => {
                warn!("could not render report: {e}");
                return;
            }
        };
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("could not write report: {e}");
        }
    }
}

/// Routes reports into the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, report: &ControlReport) {
        info!(
            temperature = report.temperature,
            cooling_power = report.cooling_power,
            "{report}"
        );
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<ControlReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ControlReport> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for MemorySink {
    fn report(&self, report: &ControlReport) {
        let mut reports = match self.reports.lock() {
            Ok(reports) => reports,
            Err(poisoned) => poisoned.into_inner(),
        };
        reports.push(*report);
    }
}

/// Forwards reports to another thread. A disconnected receiver is ignored.
impl ReportSink for Sender<ControlReport> {
    fn report(&self, report: &ControlReport) {
        let _ = self.try_send(*report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ControlReport {
        ControlReport {
            temperature: 27,
            cooling_power: 12.345,
        }
    }

    #[test]
    fn text_line_matches_console_format() {
        assert_eq!(
            sample_report().to_string(),
            "Temperature received: 27 C - Cooling Power: 12.3%"
        );
        let saturated = ControlReport {
            temperature: 40,
            cooling_power: 100.0,
        };
        assert_eq!(
            saturated.to_string(),
            "Temperature received: 40 C - Cooling Power: 100.0%"
        );
    }

    #[test]
    fn writer_sink_emits_lines() {
        let sink = WriterSink::new(Vec::new(), ReportFormat::Text);
        sink.report(&sample_report());
        sink.report(&ControlReport {
            temperature: 24,
            cooling_power: 0.0,
        });
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "Temperature received: 27 C - Cooling Power: 12.3%\n\
             Temperature received: 24 C - Cooling Power: 0.0%\n"
        );
    }

    #[test]
    fn json_sink_emits_objects() {
        let sink = WriterSink::new(Vec::new(), ReportFormat::Json);
        sink.report(&sample_report());
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["temperature"], 27);
        assert_eq!(value["cooling_power"], 12.345);
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        for t in 20..23 {
            sink.report(&ControlReport {
                temperature: t,
                cooling_power: 0.0,
            });
        }
        let temps: Vec<i32> = sink.reports().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![20, 21, 22]);
    }

    #[test]
    fn channel_sink_forwards() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.report(&sample_report());
        assert_eq!(rx.try_recv().unwrap(), sample_report());
        drop(rx);
        // no receiver left: silently ignored
        tx.report(&sample_report());
    }
}
