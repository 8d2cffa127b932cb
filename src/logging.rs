use crate::settings::AppSettings;
use crate::shared::paths::get_log_dir;
use std::collections::HashMap;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Guards that must be kept alive to ensure logs are flushed
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

/// Multi-target writer that routes logs to different files based on target
struct PluginWriter {
    writers: HashMap<String, tracing_appender::non_blocking::NonBlocking>,
    system_writer: tracing_appender::non_blocking::NonBlocking,
}

impl PluginWriter {
    fn new(
        writers: HashMap<String, tracing_appender::non_blocking::NonBlocking>,
        system_writer: tracing_appender::non_blocking::NonBlocking,
    ) -> Self {
        Self {
            writers,
            system_writer,
        }
    }
}

impl<'a> MakeWriter<'a> for PluginWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        Box::new(self.system_writer.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        let target = meta.target();

        // Check if target matches any plugin
        for (plugin_name, writer) in &self.writers {
            if target == plugin_name || target.starts_with(&format!("{}::", plugin_name)) {
                return Box::new(writer.clone());
            }
        }

        // Default to system writer
        Box::new(self.system_writer.clone())
    }
}

/// Initialize the logging system with per-plugin log files
pub fn init_logging(settings: &AppSettings) -> LoggingGuards {
    let log_dir = get_log_dir();

    // Create logs directory if it doesn't exist
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    let mut guards = Vec::new();
    let mut plugin_writers = HashMap::new();

    // Known plugins that get their own log files
    let plugins = ["todos", "bookmarks", "notes"];

    // Create non-blocking writers for each plugin
    for plugin in plugins {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &log_dir, format!("{}.log", plugin));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        plugin_writers.insert(plugin.to_string(), non_blocking);
        guards.push(guard);
    }

    // System log writer (default)
    let system_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "system.log");
    let (system_writer, system_guard) = tracing_appender::non_blocking(system_appender);
    guards.push(system_guard);

    // Create the multi-target writer
    let plugin_writer = PluginWriter::new(plugin_writers, system_writer);

    // Build the subscriber with env filter; RUST_LOG wins over settings
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(plugin_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global tracing subscriber");

    tracing::info!(target: "system", "Logging initialized at {:?}", log_dir);

    LoggingGuards { _guards: guards }
}
