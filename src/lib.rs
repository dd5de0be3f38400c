//! Execute a command as a new session leader and, while it runs, sample
//! resource usage for every process in that session, producing a
//! time-windowed report of peak and average usage alongside the command's
//! captured output.

pub mod config;
pub mod format;
pub mod poller;
pub mod report;
pub mod sample;
pub mod system;
