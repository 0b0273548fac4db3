use crate::error::{DecompositionError, DecompositionResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Rendering of `CREATE WINDOW` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// `CREATE WINDOW AWindow#time(20 seconds)`
    #[default]
    Paper,
    /// `CREATE WINDOW AWindow.win:time(20 seconds) as BaseEvent`
    Esper,
}

impl WindowMode {
    pub fn all() -> &'static [WindowMode] {
        &[WindowMode::Paper, WindowMode::Esper]
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowMode::Paper => "paper",
            WindowMode::Esper => "esper",
        }
    }
}

impl FromStr for WindowMode {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paper" => Ok(WindowMode::Paper),
            "esper" => Ok(WindowMode::Esper),
            _ => Err(DecompositionError::config(&format!(
                "Unsupported window mode: {}. Supported modes: {}",
                s,
                WindowMode::all()
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Settings for one decomposition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    pub window_mode: WindowMode,
    /// Prefix of generated stream names, `<prefix>_<tag>_<n>`.
    pub name_prefix: String,
    /// Aggregate stream used by the HAVING rewrite when the query has no
    /// INSERT INTO target.
    pub aggregate_stream: String,
    /// Event type named by esper-mode window declarations.
    pub base_event_type: String,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            window_mode: WindowMode::default(),
            name_prefix: "x".to_string(),
            aggregate_stream: "AggOut".to_string(),
            base_event_type: "BaseEvent".to_string(),
        }
    }
}

impl DecompositionConfig {
    pub fn with_window_mode(window_mode: WindowMode) -> Self {
        Self {
            window_mode,
            ..Self::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> DecompositionResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> DecompositionResult<Self> {
        let config: DecompositionConfig = toml::from_str(raw).map_err(|e| {
            DecompositionError::config(&format!("Failed to parse configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `EPLDECOMP_*` environment variables. Invalid
    /// values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = env::var("EPLDECOMP_WINDOW_MODE") {
            match mode.parse() {
                Ok(mode) => config.window_mode = mode,
                Err(e) => log::warn!("Ignoring EPLDECOMP_WINDOW_MODE: {}", e),
            }
        }
        if let Ok(prefix) = env::var("EPLDECOMP_NAME_PREFIX") {
            config.name_prefix = prefix;
        }
        if let Ok(stream) = env::var("EPLDECOMP_AGGREGATE_STREAM") {
            config.aggregate_stream = stream;
        }
        if let Ok(event_type) = env::var("EPLDECOMP_BASE_EVENT_TYPE") {
            config.base_event_type = event_type;
        }

        if let Err(e) = config.validate() {
            log::warn!("Falling back to default configuration: {}", e);
            return Self {
                window_mode: config.window_mode,
                ..Self::default()
            };
        }
        config
    }

    pub fn validate(&self) -> DecompositionResult<()> {
        for (field, value) in [
            ("name_prefix", &self.name_prefix),
            ("aggregate_stream", &self.aggregate_stream),
            ("base_event_type", &self.base_event_type),
        ] {
            if !is_identifier(value) {
                return Err(DecompositionError::config(&format!(
                    "{} must be an identifier, got '{}'",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

/// Default event schema shared by fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub streams: Vec<String>,
    pub fields: Vec<String>,
    pub timestamp_field: String,
}

pub const DEFAULT_SCHEMA_STREAMS: &[&str] = &["DetectMov", "BaseThermRead", "AlertSmoke", "ErrorEvt"];
pub const DEFAULT_FIELDS: &[&str] = &["camera", "therm", "temp", "humid", "x", "y", "sensor"];
pub const TIMESTAMP_FIELD: &str = "ts";

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            streams: DEFAULT_SCHEMA_STREAMS.iter().map(|s| s.to_string()).collect(),
            fields: DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect(),
            timestamp_field: TIMESTAMP_FIELD.to_string(),
        }
    }
}

pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
