use std::collections::HashSet;

use chrono::Local;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::sample::{ProcessStats, Sample, StatsError};

/// Per-tick stat collection for an explicit PID set.
///
/// Owns the `sysinfo::System` so CPU usage can be derived from the delta
/// since the previous tick's refresh.
pub struct Sampler {
    sys: System,
    total_memory: u64,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let total_memory = sys.total_memory();
        Sampler { sys, total_memory }
    }

    /// Build one `Sample` covering every PID in `pids` that is still alive.
    ///
    /// Best-effort: a PID that exits between discovery and the refresh is
    /// dropped from this tick's sample only.
    pub fn sample(&mut self, pids: &HashSet<u32>) -> Result<Sample, StatsError> {
        let targets: Vec<Pid> = pids.iter().map(|&p| Pid::from_u32(p)).collect();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&targets),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );

        let timestamp = Local::now().fixed_offset();
        let mut sample = Sample::new();
        for &pid in pids {
            let Some(process) = self.sys.process(Pid::from_u32(pid)) else {
                continue;
            };
            let rss = process.memory();
            let vsz = process.virtual_memory();
            let pmem = if self.total_memory > 0 {
                rss as f64 / self.total_memory as f64 * 100.0
            } else {
                0.0
            };
            let stats =
                ProcessStats::new(f64::from(process.cpu_usage()), pmem, rss, vsz, timestamp)?;
            sample.add_pid(pid, stats);
        }
        Ok(sample)
    }
}
