#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Integration tests for the full pipeline: command executor on producer
//! threads, relay queue, wake primitive, sinks on the consumer thread.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anvil_core::command::{CommandCaller, EMPTY_STATUS_JSON};
use anvil_core::config::CommandConfig;
use anvil_core::log_record::parse_logs;
use anvil_core::message::LogBatch;
use anvil_core::relay::{
    CondvarWake, DataSink, DiagnosticChannel, NotifyWake, Relay, RelaySinks, WakeSignal,
};

#[derive(Default)]
struct Collector {
    texts: RefCell<Vec<String>>,
    batches: RefCell<Vec<LogBatch>>,
}

impl DataSink<String> for Collector {
    fn add_data(&self, payload: String) {
        self.texts.borrow_mut().push(payload);
    }
}

impl DataSink<LogBatch> for Collector {
    fn add_data(&self, payload: LogBatch) {
        self.batches.borrow_mut().push(payload);
    }
}

impl DiagnosticChannel for Collector {
    fn write(&self, text: &str) {
        self.texts.borrow_mut().push(text.to_string());
    }
}

struct Sinks {
    profiles: Rc<Collector>,
    processes: Rc<Collector>,
    logs: Rc<Collector>,
    diagnostics: Rc<Collector>,
}

impl Sinks {
    fn new() -> Self {
        Self {
            profiles: Rc::default(),
            processes: Rc::default(),
            logs: Rc::default(),
            diagnostics: Rc::default(),
        }
    }

    fn relay(&self, wake: Arc<dyn WakeSignal>) -> Relay {
        Relay::new(
            wake,
            RelaySinks {
                profiles: self.profiles.clone(),
                processes: self.processes.clone(),
                logs: self.logs.clone(),
                diagnostics: self.diagnostics.clone(),
            },
        )
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

#[test]
fn producers_feed_blocking_consumer() {
    let caller = Arc::new(CommandCaller::new(CommandConfig {
        escalation: Vec::new(),
        status: argv(&["false"]),
        unconfined: argv(&["printf", "42 /usr/bin/nc not confined"]),
        logs: argv(&[
            "printf",
            "audit: apparmor=\"DENIED\" operation=\"open\" profile=\"nc\" name=\"/etc/passwd\"\n",
        ]),
        ..CommandConfig::default()
    }));
    let sinks = Sinks::new();
    let wake = Arc::new(CondvarWake::new());
    let relay = sinks.relay(wake.clone());
    let stop = Arc::new(AtomicBool::new(false));

    let handle = relay.handle();
    let coordinator = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let workers = vec![
                {
                    let (caller, handle) = (Arc::clone(&caller), handle.clone());
                    thread::spawn(move || handle.submit_profile_update(caller.get_status_text()))
                },
                {
                    let (caller, handle) = (Arc::clone(&caller), handle.clone());
                    thread::spawn(move || {
                        handle.submit_process_update(caller.get_unconfined_text());
                    })
                },
                {
                    let (caller, handle) = (Arc::clone(&caller), handle.clone());
                    thread::spawn(move || {
                        handle.submit_log_update(parse_logs(&caller.get_logs_text()));
                    })
                },
            ];
            for worker in workers {
                worker.join().unwrap();
            }
            stop.store(true, Ordering::Release);
        })
    };

    let total = relay.run_blocking(&wake, &stop);
    coordinator.join().unwrap();

    assert_eq!(total, 3);
    assert_eq!(*sinks.profiles.texts.borrow(), vec![EMPTY_STATUS_JSON]);
    assert_eq!(
        *sinks.processes.texts.borrow(),
        vec!["42 /usr/bin/nc not confined"]
    );
    let batches = sinks.logs.batches.borrow();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].name, "/etc/passwd");
    assert!(sinks.diagnostics.texts.borrow().is_empty());
}

#[tokio::test]
async fn coalesced_notify_wake_strands_nothing() {
    let sinks = Sinks::new();
    let wake = Arc::new(NotifyWake::new());
    let relay = sinks.relay(wake.clone());

    let handle = relay.handle();
    handle.submit_profile_update("A");
    handle.submit_process_update("B");
    handle.submit_diagnostic("C");

    // Three signals, one stored permit.
    let total = relay.run_until(&wake, async {}).await;

    assert_eq!(total, 3);
    assert_eq!(*sinks.profiles.texts.borrow(), vec!["A"]);
    assert_eq!(*sinks.processes.texts.borrow(), vec!["B"]);
    assert_eq!(*sinks.diagnostics.texts.borrow(), vec!["C"]);
    assert_eq!(relay.pending(), 0);
}

#[test]
fn string_overload_never_errors_on_failing_command() {
    let caller = CommandCaller::new(CommandConfig {
        escalation: Vec::new(),
        ..CommandConfig::default()
    });
    assert_eq!(
        caller.run_or(&["sh", "-c", "exit 7"], "fallback value"),
        "fallback value"
    );
}
