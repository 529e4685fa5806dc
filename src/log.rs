//! Query logging.
//!
//! Either a set of levels emitted through `tracing`, or a callback that
//! receives every event.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::error::QuarryError;
use crate::transpiler::CompiledQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Query,
    Error,
}

/// An event handed to a log callback.
#[derive(Debug)]
pub enum LogEvent<'a> {
    Query {
        sql: &'a str,
        parameters: &'a [Value],
        duration_ms: f64,
    },
    Error {
        error: &'a QuarryError,
        sql: &'a str,
        parameters: &'a [Value],
        duration_ms: f64,
    },
}

impl LogEvent<'_> {
    pub fn level(&self) -> LogLevel {
        match self {
            LogEvent::Query { .. } => LogLevel::Query,
            LogEvent::Error { .. } => LogLevel::Error,
        }
    }
}

pub type LogCallback = Arc<dyn Fn(&LogEvent<'_>) + Send + Sync>;

#[derive(Clone)]
pub enum LogConfig {
    Levels(Vec<LogLevel>),
    Callback(LogCallback),
}

impl LogConfig {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&LogEvent<'_>) + Send + Sync + 'static,
    {
        LogConfig::Callback(Arc::new(f))
    }
}

impl std::fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogConfig::Levels(levels) => f.debug_tuple("Levels").field(levels).finish(),
            LogConfig::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A resolved [`LogConfig`].
#[derive(Debug, Clone)]
pub struct Log {
    config: LogConfig,
}

impl Log {
    /// `None` when nothing would ever be logged.
    pub fn new(config: LogConfig) -> Option<Self> {
        match &config {
            LogConfig::Levels(levels) if levels.is_empty() => None,
            _ => Some(Self { config }),
        }
    }

    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        match &self.config {
            LogConfig::Levels(levels) => levels.contains(&level),
            LogConfig::Callback(_) => true,
        }
    }

    pub fn query(&self, query: &CompiledQuery, duration: Duration) {
        if !self.is_level_enabled(LogLevel::Query) {
            return;
        }
        self.emit(LogEvent::Query {
            sql: &query.sql,
            parameters: &query.parameters,
            duration_ms: duration.as_secs_f64() * 1000.0,
        });
    }

    pub fn error(&self, error: &QuarryError, query: &CompiledQuery, duration: Duration) {
        if !self.is_level_enabled(LogLevel::Error) {
            return;
        }
        self.emit(LogEvent::Error {
            error,
            sql: &query.sql,
            parameters: &query.parameters,
            duration_ms: duration.as_secs_f64() * 1000.0,
        });
    }

    fn emit(&self, event: LogEvent<'_>) {
        match &self.config {
            LogConfig::Callback(callback) => callback(&event),
            LogConfig::Levels(_) => match event {
                LogEvent::Query {
                    sql,
                    parameters,
                    duration_ms,
                } => {
                    tracing::debug!(target: "quarry::query", sql, ?parameters, duration_ms, "query executed");
                }
                LogEvent::Error {
                    error,
                    sql,
                    parameters,
                    duration_ms,
                } => {
                    tracing::error!(target: "quarry::query", %error, sql, ?parameters, duration_ms, "query failed");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::driver::raw_query;

    #[test]
    fn test_empty_levels_disable_logging() {
        assert!(Log::new(LogConfig::Levels(vec![])).is_none());
    }

    #[test]
    fn test_callback_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let log = Log::new(LogConfig::callback(move |event| {
            sink.lock().unwrap().push(event.level());
        }))
        .unwrap();

        let query = raw_query("select 1");
        log.query(&query, Duration::from_millis(3));
        log.error(
            &QuarryError::Connection("gone".into()),
            &query,
            Duration::from_millis(1),
        );
        assert_eq!(*seen.lock().unwrap(), vec![LogLevel::Query, LogLevel::Error]);
    }

    #[test]
    fn test_levels_filter() {
        let log = Log::new(LogConfig::Levels(vec![LogLevel::Error])).unwrap();
        assert!(log.is_level_enabled(LogLevel::Error));
        assert!(!log.is_level_enabled(LogLevel::Query));
    }
}
