use std::collections::BTreeSet;

use chrono::DateTime;
use runmon::report::{Report, SubReport};
use runmon::sample::{ProcessStats, Sample};
use runmon::system::info::SystemProbe;

fn probe() -> SystemProbe {
    SystemProbe {
        max_memory_total: 16 * 1024 * 1024 * 1024,
        cpu_total: 8,
        max_ppn: 8,
        uid: "tester".to_string(),
    }
}

fn keys(value: &serde_json::Value) -> BTreeSet<String> {
    value
        .as_object()
        .expect("expected a JSON object")
        .keys()
        .cloned()
        .collect()
}

fn finalized_report() -> Report {
    let mut report = Report::new("sh -c 'echo hi'".to_string(), 1000, probe(), 1_700_000_000.0);
    let mut window = SubReport::new(0);
    let mut tick = Sample::new();
    tick.add_pid(
        1001,
        ProcessStats::new(
            12.5,
            0.8,
            64 * 1024,
            256 * 1024,
            DateTime::parse_from_rfc3339("2024-06-11T10:09:37-04:00").unwrap(),
        )
        .unwrap(),
    );
    window.fold(&tick);
    report.seal(window);
    report.finalize(
        1_700_000_001.5,
        1.5,
        "hi\n".to_string(),
        String::new(),
        Some(0),
    );
    report
}

#[test]
fn top_level_key_set() {
    let value = serde_json::to_value(finalized_report()).unwrap();
    // stderr was empty and is therefore omitted.
    let expected: BTreeSet<String> = ["command", "system", "subreports", "stdout", "exit_code"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(keys(&value), expected);
    assert_eq!(value["stdout"], "hi\n");
    assert_eq!(value["exit_code"], 0);
}

#[test]
fn system_key_set_and_values() {
    let value = serde_json::to_value(finalized_report()).unwrap();
    let expected: BTreeSet<String> = [
        "max_memory_total",
        "cpu_total",
        "max_ppn",
        "sid",
        "uid",
        "start_time",
        "end_time",
        "run_time_seconds",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(keys(&value["system"]), expected);
    assert_eq!(value["system"]["max_memory_total"], 16u64 * 1024 * 1024 * 1024);
    assert_eq!(value["system"]["uid"], "tester");
    assert_eq!(value["system"]["run_time_seconds"], "1.5");
}

#[test]
fn subreport_peaks_are_keyed_by_pid_with_full_stats() {
    let value = serde_json::to_value(finalized_report()).unwrap();
    let stats = &value["subreports"][0]["peaks"]["1001"];
    let expected: BTreeSet<String> = ["pcpu", "pmem", "rss", "vsz", "timestamp"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(keys(stats), expected);
    assert_eq!(stats["rss"], 64 * 1024);
    // RFC 3339 with an explicit offset.
    let timestamp = stats["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[test]
fn unfinalized_report_omits_end_of_run_fields() {
    let report = Report::new("sleep 1".to_string(), 1, probe(), 0.0);
    let value = serde_json::to_value(report).unwrap();
    assert!(value["system"].get("end_time").is_none());
    assert!(value["system"].get("run_time_seconds").is_none());
    assert!(value.get("exit_code").is_none());
}
