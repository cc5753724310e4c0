//! Plain-text log files
//!
//! Lines in the HDFS layout `<date> <time> <pid> <LEVEL> <component>: <message>`
//! are split into their fields. Any other non-blank line becomes an event
//! whose message is the whole line.

use crate::models::LogEvent;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

static HDFS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{6}\s+\d{6}\s+\d+\s+(?P<level>[A-Za-z]+)\s+(?P<component>[^\s:]+):\s*(?P<message>.*)$")
        .expect("log line pattern is valid")
});

/// Parse one log line; blank lines yield `None`
pub fn parse_log_line(line: &str) -> Option<LogEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match HDFS_LINE.captures(line) {
        Some(caps) if !caps["message"].trim().is_empty() => Some(LogEvent::with_source(
            caps["message"].trim(),
            &caps["component"],
            &caps["level"],
        )),
        _ => Some(LogEvent::new(line)),
    }
}

/// Read every event from a log file, in file order
pub fn read_log_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<LogEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for line in reader.lines() {
        if let Some(event) = parse_log_line(&line?) {
            events.push(event);
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_hdfs_line() {
        let line = "081109 203615 148 INFO dfs.DataNode$PacketResponder: PacketResponder 1 for block blk_38865049064139660 terminating";
        let event = parse_log_line(line).unwrap();
        assert_eq!(event.level, "INFO");
        assert_eq!(event.component, "dfs.DataNode$PacketResponder");
        assert_eq!(
            event.message,
            "PacketResponder 1 for block blk_38865049064139660 terminating"
        );
    }

    #[test]
    fn test_unstructured_line_kept_whole() {
        let event = parse_log_line("kernel panic: not syncing").unwrap();
        assert_eq!(event.message, "kernel panic: not syncing");
        assert_eq!(event.component, "");
        assert_eq!(event.level, "");
    }

    #[test]
    fn test_blank_line_skipped() {
        assert!(parse_log_line("   ").is_none());
    }

    #[test]
    fn test_read_log_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "081109 203518 143 INFO dfs.DataNode$DataXceiver: Receiving block blk_-1608999687919862906 src: /10.250.19.102:54106 dest: /10.250.19.102:50010").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "081109 203519 145 WARN dfs.FSNamesystem: BLOCK* NameSystem.addStoredBlock: redundant").unwrap();

        let events = read_log_file(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, "WARN");
        assert_eq!(events[1].component, "dfs.FSNamesystem");
    }
}
