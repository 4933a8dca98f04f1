use std::io::Write;

use clap::ValueEnum;
use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// env_logger's human readable output
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// LOGLVL value to a level filter. zerolog's `fatal` and `panic` map to
/// error; anything unparseable falls back to info and reports `false`.
pub fn parse_level(level: &str) -> (LevelFilter, bool) {
    match level.trim().to_lowercase().as_str() {
        "fatal" | "panic" => (LevelFilter::Error, true),
        "disabled" => (LevelFilter::Off, true),
        other => match other.parse::<LevelFilter>() {
            Ok(filter) => (filter, true),
            Err(_) => (LevelFilter::Info, false),
        },
    }
}

/// `level` is the default for every module, `overrides` is a RUST_LOG style
/// spec applied on top of it.
fn logger_builder(level: LevelFilter, overrides: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(spec) = overrides.filter(|s| !s.trim().is_empty()) {
        builder.parse_filters(spec);
    }
    builder
}

pub fn init(format: LogFormat, level: &str) {
    let (filter, recognized) = parse_level(level);
    let rust_log = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    let mut builder = logger_builder(filter, rust_log.as_deref());

    if format == LogFormat::Json {
        builder.format(|buf, record| {
            let line = json_line(
                &buf.timestamp().to_string(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{}", line)
        });
    }

    builder.init();
    if !recognized {
        log::warn!("unknown log level {:?}, using info", level);
    }
    log::info!("log initialized (format={}, level={})", format.as_str(), filter);
}

fn json_line(time: &str, level: log::Level, target: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "time": time,
        "level": level.as_str().to_lowercase(),
        "target": target,
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use log::{Level, Log, Metadata};

    use super::*;

    fn enabled(logger: &env_logger::Logger, level: Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("debug"), (LevelFilter::Debug, true));
        assert_eq!(parse_level(" WARN "), (LevelFilter::Warn, true));
        assert_eq!(parse_level("fatal"), (LevelFilter::Error, true));
        assert_eq!(parse_level("panic"), (LevelFilter::Error, true));
        assert_eq!(parse_level("verbose"), (LevelFilter::Info, false));
        assert_eq!(parse_level(""), (LevelFilter::Info, false));
    }

    #[test]
    fn unknown_level_still_logs_errors() {
        for level in ["verbose", "fatal", "panic", "info"] {
            let (filter, _) = parse_level(level);
            let logger = logger_builder(filter, None).build();
            assert!(
                enabled(&logger, Level::Error, "badger::web::badges"),
                "{level}"
            );
        }

        let (filter, _) = parse_level("verbose");
        let logger = logger_builder(filter, None).build();
        assert!(enabled(&logger, Level::Info, "badger::main"));
        assert!(!enabled(&logger, Level::Debug, "badger::main"));
    }

    #[test]
    fn rust_log_overrides_level() {
        let logger = logger_builder(LevelFilter::Info, Some("badger::cloudbuild=debug")).build();
        assert!(enabled(&logger, Level::Debug, "badger::cloudbuild"));
        assert!(!enabled(&logger, Level::Debug, "badger::web"));
        assert!(enabled(&logger, Level::Info, "badger::web"));

        let logger = logger_builder(LevelFilter::Info, Some("warn")).build();
        assert!(!enabled(&logger, Level::Info, "badger::web"));
    }

    #[test]
    fn json_line_fields() {
        let line = json_line(
            "2024-05-12T15:35:17Z",
            log::Level::Warn,
            "badger::web",
            "list builds failed",
        );
        assert_eq!(line["level"], "warn");
        assert_eq!(line["target"], "badger::web");
        assert_eq!(line["message"], "list builds failed");
        assert_eq!(line["time"], "2024-05-12T15:35:17Z");
    }
}
