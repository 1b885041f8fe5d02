//! Load progress reporting.
//!
//! Progress is emitted on **stderr** so stdout keeps only the final summary.
//! Writing events are throttled to every [`REPORT_EVERY`] rows plus the last.

use std::io::Write;
use std::str::FromStr;

/// Emit a writing event every this many rows.
pub const REPORT_EVERY: u64 = 250;

/// A single progress event for a load.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadProgressEvent {
    /// Reading and planning the worksheet.
    Reading { sheet: String },
    /// `n` of `total` records written.
    Writing { n: u64, total: u64 },
}

/// Receives progress events from the loader.
pub trait LoadProgressReporter: Send + Sync {
    fn report(&self, event: LoadProgressEvent);
}

/// Human-friendly progress on stderr: "load  writing  1,250 / 3,000 records".
pub struct StderrProgress;

impl LoadProgressReporter for StderrProgress {
    fn report(&self, event: LoadProgressEvent) {
        let line = match &event {
            LoadProgressEvent::Reading { sheet } => format!("load  reading '{}'...\n", sheet),
            LoadProgressEvent::Writing { n, total } => format!(
                "load  writing  {} / {} records\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl LoadProgressReporter for JsonProgress {
    fn report(&self, event: LoadProgressEvent) {
        let obj = match &event {
            LoadProgressEvent::Reading { sheet } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "sheet": sheet
            }),
            LoadProgressEvent::Writing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "writing",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl LoadProgressReporter for NoProgress {
    fn report(&self, _event: LoadProgressEvent) {}
}

/// Whether row `n` of `total` should produce a writing event.
pub fn should_report(n: u64, total: u64) -> bool {
    n == total || n % REPORT_EVERY == 0
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn LoadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "invalid progress mode '{}': expected off, human, or json",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn throttling() {
        assert!(!should_report(1, 1000));
        assert!(should_report(250, 1000));
        assert!(should_report(999, 999));
    }

    #[test]
    fn parses_modes() {
        assert_eq!("json".parse::<ProgressMode>(), Ok(ProgressMode::Json));
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
