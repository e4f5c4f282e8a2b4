use featurit::*;
use log::kv::Key;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Debug level shows where flags come from and how they resolve.
    log::set_max_level(LevelFilter::Debug);
    log::set_logger(&PrintLog {}).unwrap();

    let tenant = std::env::var("FEATURIT_TENANT").unwrap_or_else(|_| "my-tenant".to_owned());
    let api_key = std::env::var("FEATURIT_API_KEY").unwrap_or_else(|_| "api-key".to_owned());

    let client = Client::builder(&tenant, &api_key)
        .polling_mode(PollingMode::AutoPoll(Duration::from_secs(30)))
        .backup_cache(std::sync::Arc::new(DiskCache::new(std::env::temp_dir())))
        .user_context(
            UserContext::new()
                .user_id("1234")
                .custom("email", "info@featurit.com"),
        )
        .build()
        .unwrap();

    if let Err(err) = client.wait_for_ready(Duration::from_secs(5)).await {
        println!("not ready: {err}");
    }

    let mut names: Vec<String> = client.all_flags().into_keys().collect();
    names.sort();
    for name in names {
        println!(
            "{name}: active={}, version={}",
            client.is_active(&name),
            client.version(&name)
        );
    }
}

// Example log implementation.
pub struct PrintLog {}

impl Log for PrintLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("featurit")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        match record.key_values().get(Key::from("event_id")) {
            Some(event_id) => println!("{level} [{event_id}] {}", record.args()),
            None => println!("{level} {}", record.args()),
        }
    }

    fn flush(&self) {}
}
