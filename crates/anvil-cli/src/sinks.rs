//! Terminal sinks: render relayed updates as plain text.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::Value;

use anvil_core::message::LogBatch;
use anvil_core::relay::DataSink;

/// Shared writer for the three printers. Write errors are logged and dropped,
/// since sinks cannot fail.
pub struct Printer<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> Printer<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "Failed to write output");
        }
    }
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Printer<Vec<u8>> {
    /// In-memory printer, for capturing output.
    pub const fn buffer() -> Self {
        Self::new(Vec::new())
    }

    /// Everything written so far.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }
}

/// Prints an `aa-status --json` document as a per-mode summary plus one line
/// per profile. Anything that is not such a document is printed as-is.
pub struct ProfilesPrinter<W: Write>(pub Printer<W>);

impl<W: Write> DataSink<String> for ProfilesPrinter<W> {
    fn add_data(&self, payload: String) {
        let rendered = render_status(&payload).unwrap_or(payload);
        self.0.emit(&ensure_newline(rendered));
    }
}

/// Prints the unconfined-process listing.
pub struct ProcessesPrinter<W: Write>(pub Printer<W>);

impl<W: Write> DataSink<String> for ProcessesPrinter<W> {
    fn add_data(&self, payload: String) {
        let text = if payload.trim().is_empty() {
            "No unconfined processes reported.\n".to_string()
        } else {
            ensure_newline(payload)
        };
        self.0.emit(&text);
    }
}

/// Prints one line per AppArmor audit record.
pub struct LogsPrinter<W: Write>(pub Printer<W>);

impl<W: Write> DataSink<LogBatch> for LogsPrinter<W> {
    fn add_data(&self, payload: LogBatch) {
        if payload.is_empty() {
            self.0.emit("No AppArmor log entries found.\n");
            return;
        }
        let mut text = String::new();
        for record in &payload {
            let timestamp = record.timestamp.as_deref().unwrap_or("-");
            let pid = record.pid.map_or_else(|| "-".to_string(), |p| p.to_string());
            text.push_str(&format!(
                "[{timestamp}] {:<7} {:<14} profile={} name={} pid={pid}\n",
                record.event, record.operation, record.profile, record.name
            ));
        }
        self.0.emit(&text);
    }
}

fn render_status(payload: &str) -> Option<String> {
    let doc: Value = serde_json::from_str(payload).ok()?;
    let profiles = doc.get("profiles")?.as_object()?;

    let mut by_mode: BTreeMap<&str, usize> = BTreeMap::new();
    let mut lines: Vec<String> = profiles
        .iter()
        .map(|(name, mode)| {
            let mode = mode.as_str().unwrap_or("unknown");
            *by_mode.entry(mode).or_default() += 1;
            format!("  {name}  ({mode})")
        })
        .collect();
    lines.sort();

    let modes: Vec<String> = by_mode
        .iter()
        .map(|(mode, count)| format!("{mode}: {count}"))
        .collect();
    let mut text = format!("{} profiles loaded", profiles.len());
    if !modes.is_empty() {
        text.push_str(&format!(" ({})", modes.join(", ")));
    }
    text.push('\n');
    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }
    Some(text)
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
