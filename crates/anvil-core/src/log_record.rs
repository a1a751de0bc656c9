//! AppArmor audit records scraped from the kernel log.
//!
//! Implements a tolerant reader: lines without an `apparmor=` field are
//! skipped, unknown fields are ignored.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::message::LogBatch;

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*(\d+\.\d+)\]").expect("static regex is valid"));
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([a-z_]+)=(?:"([^"]*)"|(\S+))"#).expect("static regex is valid")
});

/// One AppArmor audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Seconds since boot as printed by `dmesg`, if present.
    pub timestamp: Option<String>,
    /// Value of the `apparmor=` field (`DENIED`, `ALLOWED`, `AUDIT`, `STATUS`).
    pub event: String,
    pub operation: String,
    pub profile: String,
    /// Object the operation targeted (file path, socket family, ...).
    pub name: String,
    pub pid: Option<u32>,
    pub comm: Option<String>,
    pub raw: String,
}

impl LogRecord {
    /// Parse a single kernel log line. Returns `None` for non-AppArmor lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: HashMap<&str, &str> = FIELD_RE
            .captures_iter(line)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
                Some((key, value))
            })
            .collect();

        let event = fields.get("apparmor")?.to_string();
        let field = |key: &str| fields.get(key).map(ToString::to_string);

        Some(Self {
            timestamp: TIMESTAMP_RE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            event,
            operation: field("operation").unwrap_or_default(),
            profile: field("profile").unwrap_or_default(),
            name: field("name").unwrap_or_default(),
            pid: fields.get("pid").and_then(|v| v.parse().ok()),
            comm: field("comm"),
            raw: line.to_string(),
        })
    }

    pub fn is_denial(&self) -> bool {
        self.event == "DENIED"
    }
}

/// Parse every AppArmor record in a kernel log dump, preserving line order.
pub fn parse_logs(text: &str) -> LogBatch {
    let batch: LogBatch = text
        .lines()
        .filter_map(LogRecord::parse_line)
        .map(Arc::new)
        .collect();
    tracing::debug!(records = batch.len(), "Parsed kernel log");
    batch
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DENIED: &str = r#"[ 1234.567890] audit: type=1400 audit(1700000000.123:45): apparmor="DENIED" operation="open" profile="/usr/bin/foo" name="/etc/shadow" pid=4242 comm="foo" requested_mask="r" denied_mask="r" fsuid=0 ouid=0"#;

    #[test]
    fn parses_denial_fields() {
        let record = LogRecord::parse_line(DENIED).unwrap();
        assert_eq!(record.timestamp.as_deref(), Some("1234.567890"));
        assert_eq!(record.event, "DENIED");
        assert_eq!(record.operation, "open");
        assert_eq!(record.profile, "/usr/bin/foo");
        assert_eq!(record.name, "/etc/shadow");
        assert_eq!(record.pid, Some(4242));
        assert_eq!(record.comm.as_deref(), Some("foo"));
        assert_eq!(record.raw, DENIED);
        assert!(record.is_denial());
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let line = r#"audit: type=1400 apparmor="STATUS" operation="profile_load" profile="unconfined" name="snap.foo""#;
        let record = LogRecord::parse_line(line).unwrap();
        assert_eq!(record.timestamp, None);
        assert_eq!(record.event, "STATUS");
        assert_eq!(record.name, "snap.foo");
        assert_eq!(record.pid, None);
        assert!(!record.is_denial());
    }

    #[test]
    fn unquoted_values_are_read() {
        let line = "audit: apparmor=ALLOWED operation=exec profile=test pid=12";
        let record = LogRecord::parse_line(line).unwrap();
        assert_eq!(record.event, "ALLOWED");
        assert_eq!(record.operation, "exec");
        assert_eq!(record.pid, Some(12));
    }

    #[test]
    fn skips_non_apparmor_lines() {
        assert!(LogRecord::parse_line("[    0.000000] Linux version 6.8.0").is_none());
        assert!(LogRecord::parse_line("").is_none());
    }

    #[test]
    fn parse_logs_keeps_line_order() {
        let text = format!(
            "[ 1.0] usb 1-1: new device\n{DENIED}\n[ 2.0] eth0: link up\n\
             audit: apparmor=\"ALLOWED\" operation=\"exec\" profile=\"bar\" name=\"/bin/sh\"\n"
        );
        let batch = parse_logs(&text);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].profile, "/usr/bin/foo");
        assert_eq!(batch[1].profile, "bar");
    }
}
