//! Process-wide tracing setup for binaries built on this crate.
//!
//! Sessions log under the `generation` span, which carries `session_id` and
//! `target_id`. The JSON output keeps those fields on every line so one
//! session can be filtered out of a shared log file.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Directives used when neither `PREVIEW_LOG_LEVEL` nor `RUST_LOG` is set.
pub const DEFAULT_DIRECTIVES: &str = "warn,preview_stream=info,preview_cli=info";

const LOG_TARGETS: [&str; 2] = ["preview_stream", "preview_cli"];
const FALLBACK_LOG_FILE: &str = "preview.sessions.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Where log lines go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    /// Compact lines on stderr, so stdout stays free for generated output.
    Console,
    /// One JSON object per line, appended to this file.
    JsonFile(PathBuf),
}

/// Logging settings resolved from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub enabled: bool,
    pub directives: String,
    pub output: LogOutput,
    /// Log one line per finished session with its timing.
    pub session_spans: bool,
}

impl LogSettings {
    /// Reads the settings from the environment.
    ///
    /// - `PREVIEW_LOG`: `off` disables logging entirely.
    /// - `PREVIEW_LOG_LEVEL`: a bare level (`debug`) applies to this crate's
    ///   targets only; anything else is taken as a full filter.
    /// - `RUST_LOG`: fallback filter.
    /// - `PREVIEW_JSON_LOG_PATH`: write JSON lines to this file instead of stderr.
    /// - `PREVIEW_LOG_SESSION_SPANS`: `true` logs a line when each session ends.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let directives = match (value("PREVIEW_LOG_LEVEL"), value("RUST_LOG")) {
            (Some(level), _) => scoped_directives(&level),
            (None, Some(filter)) => filter,
            (None, None) => DEFAULT_DIRECTIVES.to_string(),
        };
        let output = match value("PREVIEW_JSON_LOG_PATH") {
            Some(path) => LogOutput::JsonFile(PathBuf::from(path)),
            None => LogOutput::Console,
        };
        Self {
            enabled: !value("PREVIEW_LOG").is_some_and(|v| v.eq_ignore_ascii_case("off")),
            directives,
            output,
            session_spans: value("PREVIEW_LOG_SESSION_SPANS")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Turns a bare level into per-target directives for this crate; full
/// filters pass through untouched.
fn scoped_directives(level: &str) -> String {
    let bare = matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    );
    if !bare {
        return level.to_string();
    }
    let mut directives = String::from("warn");
    for target in LOG_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(FALLBACK_LOG_FILE);
    (dir, file_name)
}

/// Installs the global subscriber once per process, using
/// [`LogSettings::from_env`]. Later calls do nothing.
pub fn init_observability() {
    INIT.get_or_init(|| install(&LogSettings::from_env()));
}

fn install(settings: &LogSettings) {
    if !settings.enabled {
        return;
    }
    let span_events = if settings.session_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match &settings.output {
        LogOutput::JsonFile(path) => {
            let (dir, file_name) = split_log_path(path);
            let _ = std::fs::create_dir_all(dir);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_span_events(span_events)
                .with_writer(tracing_appender::rolling::never(dir, file_name));
            let _ = tracing_subscriber::registry()
                .with(settings.env_filter())
                .with(layer)
                .try_init();
        }
        LogOutput::Console => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_span_events(span_events)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(settings.env_filter())
                .with(layer)
                .try_init();
        }
    }
}
