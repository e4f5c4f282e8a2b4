use log::kv::Key;
use log::{set_max_level, Level, Log, Metadata, Record};
use std::cell::RefCell;

pub const FLAGS_PATH: &str = "/feature-flags";
pub const ANALYTICS_PATH: &str = "/analytics";

/// A catalogue with one segmented, versioned flag ("Feat", active for userId "1")
/// and one flag active for everyone ("Simple").
pub const CATALOGUE: &str = r#"{
    "Feat": {
        "name": "Feat",
        "active": true,
        "distribution_attribute": "userId",
        "segments": [{
            "rollout_attribute": "userId",
            "rollout_percentage": 100,
            "string_rules": [{"attribute": "userId", "operator": "EQUALS", "value": "1"}],
            "number_rules": []
        }],
        "versions": [
            {"name": "v1", "distribution_percentage": 45},
            {"name": "v2", "distribution_percentage": 55}
        ]
    },
    "Simple": {
        "name": "Simple",
        "active": true,
        "distribution_attribute": "userId",
        "segments": [],
        "versions": []
    }
}"#;

pub fn response_payload(catalogue: &str) -> String {
    format!(r#"{{"data": {catalogue}}}"#)
}

pub fn construct_flag_payload(name: &str, active: bool) -> String {
    response_payload(&format!(
        r#"{{"{name}": {{"name": "{name}", "active": {active}, "distribution_attribute": "userId", "segments": [], "versions": []}}}}"#
    ))
}

pub struct RecordingLogger {}

impl RecordingLogger {
    thread_local!(pub static LOGS: RefCell<String> = RefCell::new(String::default()));

    pub fn take() -> String {
        Self::LOGS.with_borrow_mut(std::mem::take)
    }
}

impl Log for RecordingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("featurit")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let event_id = record
            .key_values()
            .get(Key::from("event_id"))
            .and_then(|id| id.to_i64())
            .unwrap_or(0);
        Self::LOGS.with_borrow_mut(|l| {
            l.push_str(format!("{level} [{event_id}] {}\n", record.args()).as_str())
        });
    }

    fn flush(&self) {}
}

pub fn log_record_init() {
    set_max_level(log::LevelFilter::Info);
    _ = log::set_logger(&RecordingLogger {});
}
