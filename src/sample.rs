use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Resource figures for one process at one instant.
///
/// Immutable once constructed. Non-finite or negative percentage fields
/// are rejected at construction, not during aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProcessStats {
    /// CPU usage percentage (can exceed 100 on multi-core hosts).
    pub pcpu: f64,
    /// Share of total physical memory, in percent.
    pub pmem: f64,
    /// Resident set size in bytes.
    pub rss: u64,
    /// Virtual address-space size in bytes.
    pub vsz: u64,
    pub timestamp: DateTime<FixedOffset>,
}

impl ProcessStats {
    pub fn new(
        pcpu: f64,
        pmem: f64,
        rss: u64,
        vsz: u64,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Self, StatsError> {
        for (field, value) in [("pcpu", pcpu), ("pmem", pmem)] {
            if !value.is_finite() {
                return Err(StatsError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(StatsError::Negative { field, value });
            }
        }
        Ok(ProcessStats {
            pcpu,
            pmem,
            rss,
            vsz,
            timestamp,
        })
    }

    /// Element-wise maximum of two snapshots, field by field.
    ///
    /// Commutative, associative, and idempotent, so the fold order across
    /// ticks does not affect the final peaks. The timestamp carries the
    /// later of the two observation times.
    pub fn max(&self, other: &ProcessStats) -> ProcessStats {
        ProcessStats {
            pcpu: self.pcpu.max(other.pcpu),
            pmem: self.pmem.max(other.pmem),
            rss: self.rss.max(other.rss),
            vsz: self.vsz.max(other.vsz),
            timestamp: self.timestamp.max(other.timestamp),
        }
    }
}

/// One tick's snapshot: a `ProcessStats` for every live PID in the session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sample {
    stats: HashMap<u32, ProcessStats>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pid(&mut self, pid: u32, stats: ProcessStats) {
        self.stats.insert(pid, stats);
    }

    pub fn stats(&self) -> &HashMap<u32, ProcessStats> {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Per-PID merge: PIDs present in both sides take the element-wise
    /// maximum, PIDs present in one side are carried over unchanged.
    pub fn max(&self, other: &Sample) -> Sample {
        let mut merged = self.clone();
        for (pid, stats) in &other.stats {
            merged
                .stats
                .entry(*pid)
                .and_modify(|current| *current = current.max(stats))
                .or_insert(*stats);
        }
        merged
    }

    pub fn total_rss(&self) -> u64 {
        self.stats.values().map(|s| s.rss).sum()
    }

    pub fn total_vsz(&self) -> u64 {
        self.stats.values().map(|s| s.vsz).sum()
    }

    pub fn total_pmem(&self) -> f64 {
        self.stats.values().map(|s| s.pmem).sum()
    }

    pub fn total_pcpu(&self) -> f64 {
        self.stats.values().map(|s| s.pcpu).sum()
    }
}

/// Running means of a window's per-tick totals.
///
/// Maintained incrementally (`mean += (value - mean) / n`) so no history is
/// retained. Zero samples serializes as an empty object to keep "never
/// sampled" distinguishable from "sampled a total of zero".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Averages {
    pub num_samples: u64,
    pub rss: f64,
    pub vsz: f64,
    pub pmem: f64,
    pub pcpu: f64,
}

impl Averages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sample(sample: &Sample) -> Self {
        let mut averages = Self::new();
        averages.update(sample);
        averages
    }

    /// Fold one sample's totals into the running means.
    pub fn update(&mut self, sample: &Sample) {
        self.num_samples += 1;
        let n = self.num_samples as f64;
        self.rss += (sample.total_rss() as f64 - self.rss) / n;
        self.vsz += (sample.total_vsz() as f64 - self.vsz) / n;
        self.pmem += (sample.total_pmem() - self.pmem) / n;
        self.pcpu += (sample.total_pcpu() - self.pcpu) / n;
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }
}

impl Serialize for Averages {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        if self.is_empty() {
            return serializer.serialize_map(Some(0))?.end();
        }
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("num_samples", &self.num_samples)?;
        map.serialize_entry("rss", &self.rss)?;
        map.serialize_entry("vsz", &self.vsz)?;
        map.serialize_entry("pmem", &self.pmem)?;
        map.serialize_entry("pcpu", &self.pcpu)?;
        map.end()
    }
}
