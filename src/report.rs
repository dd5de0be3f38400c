use serde::Serialize;

use crate::format::{format_bytes, format_duration};
use crate::sample::{Averages, Sample};
use crate::system::info::SystemProbe;

/// Peak and average usage accumulated over one report window.
///
/// A window covers elapsed time `[number * interval, (number + 1) * interval)`
/// and is sealed (pushed onto the report, never touched again) once elapsed
/// time crosses its upper bound.
#[derive(Debug, Serialize)]
pub struct SubReport {
    pub number: u64,
    pub peaks: Sample,
    pub averages: Averages,
}

impl SubReport {
    pub fn new(number: u64) -> Self {
        SubReport {
            number,
            peaks: Sample::new(),
            averages: Averages::new(),
        }
    }

    /// Merge one tick into the window: element-wise max into the peak map,
    /// the sample's totals into the running means.
    pub fn fold(&mut self, sample: &Sample) {
        self.peaks = self.peaks.max(sample);
        self.averages.update(sample);
    }
}

/// Host and run metadata attached to the report.
#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub max_memory_total: u64,
    pub cpu_total: u64,
    pub max_ppn: u64,
    pub sid: i32,
    pub uid: String,
    pub start_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_time_seconds: Option<String>,
}

/// The top-level artifact of a monitored run.
///
/// Created at spawn time, mutated only by the poller, finalized and
/// serialized exactly once after the child exits.
#[derive(Debug, Serialize)]
pub struct Report {
    pub command: String,
    pub system: SystemInfo,
    pub subreports: Vec<SubReport>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Report {
    pub fn new(command: String, sid: i32, probe: SystemProbe, start_time: f64) -> Self {
        Report {
            command,
            system: SystemInfo {
                max_memory_total: probe.max_memory_total,
                cpu_total: probe.cpu_total,
                max_ppn: probe.max_ppn,
                sid,
                uid: probe.uid,
                start_time,
                end_time: None,
                run_time_seconds: None,
            },
            subreports: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
        }
    }

    /// Return the window that should receive the next sample, sealing one
    /// `SubReport` per crossed boundary until the window invariant
    /// `elapsed < (number + 1) * interval` holds again. A slow tick that
    /// skips whole windows therefore seals them as empty rather than
    /// stretching a window past its bound.
    pub fn advance_window(&mut self, mut sub: SubReport, elapsed: f64, interval: f64) -> SubReport {
        while elapsed >= (sub.number + 1) as f64 * interval {
            tracing::debug!(number = sub.number, elapsed, "sealing report window");
            let next = SubReport::new(sub.number + 1);
            self.subreports.push(sub);
            sub = next;
        }
        sub
    }

    /// Seal the final, still-open window at end of run.
    pub fn seal(&mut self, sub: SubReport) {
        self.subreports.push(sub);
    }

    pub fn finalize(
        &mut self,
        end_time: f64,
        run_time: f64,
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    ) {
        self.system.end_time = Some(end_time);
        self.system.run_time_seconds = Some(format!("{run_time}"));
        self.stdout = stdout;
        self.stderr = stderr;
        self.exit_code = exit_code;
    }

    fn num_samples(&self) -> u64 {
        self.subreports.iter().map(|s| s.averages.num_samples).sum()
    }

    fn peak_rss(&self) -> u64 {
        self.subreports
            .iter()
            .map(|s| s.peaks.total_rss())
            .max()
            .unwrap_or(0)
    }

    /// Sample-count-weighted mean RSS across all windows.
    fn average_rss(&self) -> f64 {
        let total_samples = self.num_samples();
        if total_samples == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .subreports
            .iter()
            .map(|s| s.averages.rss * s.averages.num_samples as f64)
            .sum();
        weighted / total_samples as f64
    }

    /// Human-readable end-of-run summary, one field per line.
    pub fn execution_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Command: {}\n", self.command));
        let exit = match self.exit_code {
            Some(code) => code.to_string(),
            None => "terminated by signal".to_string(),
        };
        out.push_str(&format!("Exit code: {exit}\n"));
        let run_time = self
            .system
            .run_time_seconds
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);
        out.push_str(&format!("Wall clock time: {}\n", format_duration(run_time)));
        if self.num_samples() == 0 {
            out.push_str("No samples collected\n");
        } else {
            out.push_str(&format!(
                "Peak RSS (process tree): {}\n",
                format_bytes(self.peak_rss())
            ));
            out.push_str(&format!(
                "Average RSS: {}\n",
                format_bytes(self.average_rss() as u64)
            ));
            out.push_str(&format!(
                "Samples: {} across {} report window(s)\n",
                self.num_samples(),
                self.subreports.len()
            ));
        }
        out
    }
}
