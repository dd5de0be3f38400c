use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::process::Command;

use crate::config::MonitorConfig;
use crate::report::{Report, SubReport};
use crate::sample::StatsError;
use crate::system::discovery::processes_in_session;
use crate::system::info;
use crate::system::sampler::Sampler;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no command given")]
    EmptyCommand,

    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidInterval { name: &'static str, value: f64 },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("child terminated before its session could be inspected")]
    ChildVanished,

    #[error("could not determine session id of pid {pid}")]
    Session { pid: u32 },

    #[error("rejected process stats: {0}")]
    Stats(#[from] StatsError),

    #[error("i/o failure while monitoring child: {0}")]
    Io(#[from] std::io::Error),
}

/// Drives one monitored run: spawn the child as a session leader, tick at
/// the sample interval, fold each tick into the active report window, and
/// drain the child's output once it exits.
///
/// Per-PID races (a process exiting between discovery and its stat read)
/// are recovered locally; everything else surfaces as a `MonitorError` and
/// no report is produced.
pub struct Poller {
    sample_interval: f64,
    report_interval: f64,
}

impl Poller {
    pub fn new(monitor: &MonitorConfig) -> Result<Self, MonitorError> {
        for (name, value) in [
            ("sample-interval", monitor.sample_interval),
            ("report-interval", monitor.report_interval),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::InvalidInterval { name, value });
            }
        }
        Ok(Poller {
            sample_interval: monitor.sample_interval,
            report_interval: monitor.report_interval,
        })
    }

    pub async fn run(&self, command: &[String]) -> Result<Report, MonitorError> {
        let (program, args) = command.split_first().ok_or(MonitorError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // The child leads a fresh session so every descendant it spawns is
        // discoverable by session id.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let start_wall = unix_now();
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| MonitorError::Spawn {
            command: program.clone(),
            source,
        })?;
        let pid = child.id().ok_or(MonitorError::ChildVanished)?;
        let sid = unsafe { libc::getsid(pid as libc::pid_t) };
        if sid < 0 {
            return Err(MonitorError::Session { pid });
        }
        tracing::info!(pid, sid, command = %command.join(" "), "monitoring started");

        let mut report = Report::new(command.join(" "), sid, info::probe(), start_wall);
        let mut sampler = Sampler::new();
        let mut window = SubReport::new(0);

        loop {
            let elapsed = start.elapsed().as_secs_f64();
            window = report.advance_window(window, elapsed, self.report_interval);

            let pids = processes_in_session(sid as u32);
            let sample = sampler.sample(&pids)?;
            if sample.is_empty() {
                tracing::debug!(elapsed, "no live processes in session this tick");
            } else {
                tracing::debug!(elapsed, processes = sample.len(), "sampled session");
                window.fold(&sample);
            }

            if child.try_wait()?.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_secs_f64(self.sample_interval)).await;
        }

        // Drain: the one read of the captured output streams.
        let output = child.wait_with_output().await?;
        let end_wall = unix_now();
        let run_time = start.elapsed().as_secs_f64();
        tracing::info!(run_time, code = ?output.status.code(), "child exited");

        report.seal(window);
        report.finalize(
            end_wall,
            run_time,
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            output.status.code(),
        );
        Ok(report)
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
