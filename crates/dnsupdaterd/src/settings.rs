//! Daemon settings
//!
//! Settings come from an optional JSON file (path in `DNSUPDATER_CONFIG`)
//! overlaid with `DNSUPDATER_*` environment variables. Environment values
//! always win. The merged document is deserialized into
//! [`UpdaterConfig`], so file keys and defaults are exactly those of the
//! core configuration types.

use anyhow::{Context, Result};
use dnsupdater_core::UpdaterConfig;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::Level;

/// Environment variable naming the optional JSON settings file
pub const CONFIG_FILE_VAR: &str = "DNSUPDATER_CONFIG";

/// How a variable's text is turned into a JSON value
#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Flag,
    Seconds,
}

/// One environment variable and the config key it overrides
struct Override {
    var: &'static str,
    section: &'static str,
    key: &'static str,
    kind: Kind,
}

const OVERRIDES: &[Override] = &[
    Override {
        var: "DNSUPDATER_REGION",
        section: "provider",
        key: "region",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_ACCESS_KEY_ID",
        section: "provider",
        key: "access_key_id",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_ACCESS_KEY_SECRET",
        section: "provider",
        key: "access_key_secret",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_ENDPOINT",
        section: "provider",
        key: "endpoint",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_DOMAIN",
        section: "record",
        key: "domain",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_HOST_RECORD",
        section: "record",
        key: "host_record",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_IP_SOURCE_URL",
        section: "ip_source",
        key: "url",
        kind: Kind::Text,
    },
    Override {
        var: "DNSUPDATER_REQUIRE_IPV4",
        section: "ip_source",
        key: "require_ipv4",
        kind: Kind::Flag,
    },
    Override {
        var: "DNSUPDATER_POLL_INTERVAL_SECS",
        section: "scheduler",
        key: "poll_interval_secs",
        kind: Kind::Seconds,
    },
];

/// Keys that have no default
const REQUIRED: &[(&str, &str, &str)] = &[
    ("provider", "access_key_id", "DNSUPDATER_ACCESS_KEY_ID"),
    ("provider", "access_key_secret", "DNSUPDATER_ACCESS_KEY_SECRET"),
    ("record", "domain", "DNSUPDATER_DOMAIN"),
    ("record", "host_record", "DNSUPDATER_HOST_RECORD"),
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Everything the daemon needs to start
#[derive(Debug)]
pub struct Settings {
    pub updater: UpdaterConfig,
    pub log_level: Level,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(|var| std::env::var(var).ok())
    }

    /// Load settings through `lookup`, which resolves environment variables
    ///
    /// Empty values are treated as unset.
    pub fn load<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut document = match lookup(CONFIG_FILE_VAR) {
            Some(path) => read_file(Path::new(&path))?,
            None => Map::new(),
        };

        for o in OVERRIDES {
            if let Some(raw) = lookup(o.var) {
                let value = parse_value(o, raw.trim())?;
                section_mut(&mut document, o.section)?.insert(o.key.to_string(), value);
            }
        }

        for (section, key, var) in REQUIRED {
            let present = document
                .get(*section)
                .and_then(|s| s.get(*key))
                .and_then(Value::as_str)
                .is_some_and(|v| !v.is_empty());
            if !present {
                anyhow::bail!(
                    "{} is required. Set it via: export {}=... (or {}.{} in the config file)",
                    var,
                    var,
                    section,
                    key
                );
            }
        }

        let updater: UpdaterConfig = serde_json::from_value(Value::Object(document))
            .context("Invalid dnsupdater configuration")?;
        updater.validate()?;

        let log_level = parse_log_level(
            lookup("DNSUPDATER_LOG_LEVEL").as_deref().unwrap_or("info"),
        )?;
        let log_format = parse_log_format(
            lookup("DNSUPDATER_LOG_FORMAT").as_deref().unwrap_or("text"),
        )?;

        Ok(Self {
            updater,
            log_level,
            log_format,
        })
    }
}

fn read_file(path: &Path) -> Result<Map<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    match serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("Config file {} is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Config file {} must contain a JSON object", path.display()),
    }
}

fn section_mut<'a>(
    document: &'a mut Map<String, Value>,
    section: &str,
) -> Result<&'a mut Map<String, Value>> {
    document
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .with_context(|| format!("Config section '{}' must be a JSON object", section))
}

fn parse_value(o: &Override, raw: &str) -> Result<Value> {
    match o.kind {
        Kind::Text => Ok(Value::String(raw.to_string())),
        Kind::Flag => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => anyhow::bail!("{} must be true or false. Got: {}", o.var, raw),
        },
        Kind::Seconds => {
            let secs: u64 = raw.parse().with_context(|| {
                format!("{} must be a whole number of seconds. Got: {}", o.var, raw)
            })?;
            Ok(Value::from(secs))
        }
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DNSUPDATER_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat> {
    match raw.to_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => anyhow::bail!(
            "DNSUPDATER_LOG_FORMAT '{}' is not valid. Valid formats: text, json",
            raw
        ),
    }
}
