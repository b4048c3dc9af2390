use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging: stdout always, plus rotated file output when enabled.
pub fn init(config: &LoggingConfig) {
    // Default to info level for all modules; can be overridden via RUST_LOG
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.enabled {
        use tracing_appender::rolling;

        if let Err(e) = std::fs::create_dir_all(&config.directory) {
            eprintln!("Failed to create log directory {}: {}", config.directory, e);
        }

        cleanup_old_logs(config);

        let file_appender = match config.rotation.as_str() {
            "hourly" => rolling::hourly(&config.directory, &config.file_prefix),
            "never" => rolling::never(&config.directory, &config.file_prefix),
            _ => rolling::daily(&config.directory, &config.file_prefix),
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .init();

        // The writer guard must outlive the process; leak it.
        std::mem::forget(guard);
    } else {
        subscriber.init();
    }
}

/// Delete the oldest log files beyond the configured retention count.
/// Uses eprintln because this runs before the subscriber is installed.
pub fn cleanup_old_logs(config: &LoggingConfig) {
    if config.max_files == 0 {
        return;
    }

    let log_dir = std::path::Path::new(&config.directory);
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name();
            if !name.to_str()?.starts_with(&config.file_prefix) {
                return None;
            }
            Some((entry.path(), metadata.modified().ok()?))
        })
        .collect();

    // Newest first; everything past the retention count goes.
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(config.max_files as usize) {
        match std::fs::remove_file(path) {
            Ok(_) => eprintln!("Deleted old log file: {:?}", path),
            Err(e) => eprintln!("Failed to delete log file {:?}: {}", path, e),
        }
    }
}
