use std::collections::HashSet;
use std::fs;

/// All live PIDs whose session id matches `sid`.
///
/// Pure scan of `/proc`: no state is retained between calls. A process that
/// exits between directory enumeration and the `stat` read is skipped, not
/// an error.
pub fn processes_in_session(sid: u32) -> HashSet<u32> {
    let mut pids = HashSet::new();
    let Ok(entries) = fs::read_dir("/proc") else {
        return pids;
    };
    for entry in entries.flatten() {
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Ok(pid) = name.parse::<u32>() else {
            continue;
        };
        if session_of(pid) == Some(sid) {
            pids.insert(pid);
        }
    }
    pids
}

/// Session id from `/proc/<pid>/stat`, or `None` if the process vanished.
fn session_of(pid: u32) -> Option<u32> {
    let contents = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_session_field(&contents)
}

/// The comm field may contain spaces and parens, so split after the closing
/// `)`. Fields after comm: state(0) ppid(1) pgrp(2) session(3) tty_nr(4) ...
fn parse_session_field(stat: &str) -> Option<u32> {
    let after_comm = stat.rfind(')')? + 1;
    stat[after_comm..].split_whitespace().nth(3)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_field_parsed_after_comm() {
        let stat = "1234 (some proc) S 1 1234 4242 0 -1 4194304 1000";
        assert_eq!(parse_session_field(stat), Some(4242));
    }

    #[test]
    fn comm_with_nested_parens_and_spaces() {
        // comm is reported verbatim, including ')' characters
        let stat = "77 (weird) name)) R 1 77 9001 0 -1 0";
        assert_eq!(parse_session_field(stat), Some(9001));
    }

    #[test]
    fn truncated_record_yields_none() {
        assert_eq!(parse_session_field("12 (short) S 1"), None);
        assert_eq!(parse_session_field(""), None);
    }

    #[test]
    fn own_session_contains_a_live_pid() {
        let pid = std::process::id();
        let sid = session_of(pid).expect("own /proc stat should be readable");
        let pids = processes_in_session(sid);
        assert!(pids.contains(&pid));
    }

    #[test]
    fn unknown_session_is_empty() {
        // Session ids are PIDs; u32::MAX cannot be one.
        assert!(processes_in_session(u32::MAX).is_empty());
    }
}
